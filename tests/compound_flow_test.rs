//! Compound reads driven through a scripted reader
//!
//! Verifies that the calls run in declaration order with the same arguments,
//! and that a failing call keeps the transform from running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use valdash::domain::compound::{compose, CompoundRead, ComposeError, ContractReader, Transform};
use valdash::domain::abi::ParamSpec;

#[derive(Default)]
struct ScriptedReader {
    calls: Mutex<Vec<(String, Vec<DynSolValue>)>>,
    fail_on: Option<&'static str>,
}

impl ScriptedReader {
    fn failing_on(function: &'static str) -> Self {
        Self {
            fail_on: Some(function),
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ContractReader for ScriptedReader {
    async fn read(&self, function: &str, args: &[DynSolValue]) -> anyhow::Result<Vec<DynSolValue>> {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), args.to_vec()));
        if self.fail_on == Some(function) {
            anyhow::bail!("execution reverted");
        }
        let value = match function {
            "getPoolSelfBallots" => 1000u64,
            "getPoolaccRewardPerShare" => 2_000_000_000_000,
            "getPoolSelfBallotsRewardsDebt" => 500,
            _ => 0,
        };
        Ok(vec![DynSolValue::Uint(U256::from(value), 256)])
    }
}

fn rewards_amount() -> CompoundRead {
    CompoundRead {
        name: "Rewards Amount".to_string(),
        inputs: vec![ParamSpec::new("miner_address", "address")],
        calls: vec![
            "getPoolSelfBallots".to_string(),
            "getPoolaccRewardPerShare".to_string(),
            "getPoolSelfBallotsRewardsDebt".to_string(),
        ],
        transform: Transform::by_name("pending_rewards").unwrap(),
    }
}

fn miner() -> DynSolValue {
    DynSolValue::Address(Address::repeat_byte(0x11))
}

#[tokio::test]
async fn test_rewards_amount_calls_in_order() {
    let reader = ScriptedReader::default();
    let value = rewards_amount().run(&reader, &[miner()]).await.unwrap();

    assert_eq!(value, DynSolValue::Uint(U256::from(1500u64), 256));
    assert_eq!(
        reader.recorded(),
        vec![
            "getPoolSelfBallots",
            "getPoolaccRewardPerShare",
            "getPoolSelfBallotsRewardsDebt"
        ]
    );
    // Every call receives the same argument list
    for (_, args) in reader.calls.lock().unwrap().iter() {
        assert_eq!(args, &vec![miner()]);
    }
}

#[tokio::test]
async fn test_failure_aborts_before_transform() {
    let reader = ScriptedReader::failing_on("getPoolaccRewardPerShare");
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();
    let transform = Transform::new("count", move |_results| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(DynSolValue::Bool(true))
    });

    let err = compose(&reader, &rewards_amount().calls, &[miner()], &transform)
        .await
        .unwrap_err();

    match err {
        ComposeError::Call { index, function, .. } => {
            assert_eq!(index, 1);
            assert_eq!(function, "getPoolaccRewardPerShare");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    // The third call is never issued
    assert_eq!(reader.recorded().len(), 2);
}

#[tokio::test]
async fn test_underflow_surfaces_as_transform_error() {
    struct Debtor;

    #[async_trait]
    impl ContractReader for Debtor {
        async fn read(&self, function: &str, _args: &[DynSolValue]) -> anyhow::Result<Vec<DynSolValue>> {
            let value = if function == "getPoolSelfBallotsRewardsDebt" { 10u64 } else { 1 };
            Ok(vec![DynSolValue::Uint(U256::from(value), 256)])
        }
    }

    let err = rewards_amount().run(&Debtor, &[miner()]).await.unwrap_err();
    assert!(matches!(err, ComposeError::Transform(_)));
}
