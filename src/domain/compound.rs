//! Compound reads - several view calls combined into one derived value
//!
//! A compound read declares N read-only functions of the bound contract that
//! all take the same argument list. On submit the functions are called one
//! after another in declaration order, and a pure transform turns the ordered
//! list of results into a single value. Any failure aborts the whole run and
//! discards the partial results.

use std::fmt;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::abi::ParamSpec;

/// Scale of `accRewardPerShare` in the Validators contract
pub const ACC_REWARD_PRECISION: u64 = 1_000_000_000_000;

/// Something that can execute a read-only call by function name
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn read(&self, function: &str, args: &[DynSolValue]) -> anyhow::Result<Vec<DynSolValue>>;
}

/// Errors raised by a transform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("expected {expected} call results, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("call {0} returned no value")]
    MissingValue(usize),

    #[error("call {0} did not return an unsigned integer")]
    NotUint(usize),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("result is below zero")]
    Underflow,

    #[error("unknown transform '{0}'")]
    Unknown(String),
}

/// Errors raised by a compound read
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no calls configured")]
    NoCalls,

    #[error("call {index} ({function}) failed: {source:#}")]
    Call {
        index: usize,
        function: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}

type TransformFn =
    dyn Fn(&[Vec<DynSolValue>]) -> Result<DynSolValue, TransformError> + Send + Sync;

/// A named pure function over the ordered list of call results
#[derive(Clone)]
pub struct Transform {
    name: String,
    f: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Vec<DynSolValue>]) -> Result<DynSolValue, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Look up a built-in transform by its configuration name
    pub fn by_name(name: &str) -> Result<Self, TransformError> {
        match name {
            "pending_rewards" => Ok(Self::new(name, pending_rewards)),
            other => Err(TransformError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, results: &[Vec<DynSolValue>]) -> Result<DynSolValue, TransformError> {
        (self.f)(results)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

/// `margin * accRewardPerShare / 1e12 - rewardsDebt`
///
/// Operands are the first output of each of the three calls, in order.
pub fn pending_rewards(results: &[Vec<DynSolValue>]) -> Result<DynSolValue, TransformError> {
    if results.len() != 3 {
        return Err(TransformError::Arity {
            expected: 3,
            got: results.len(),
        });
    }
    let margin = first_uint(results, 0)?;
    let acc_per_share = first_uint(results, 1)?;
    let rewards_debt = first_uint(results, 2)?;

    let accrued = margin
        .checked_mul(acc_per_share)
        .ok_or(TransformError::Overflow)?
        / U256::from(ACC_REWARD_PRECISION);
    let pending = accrued
        .checked_sub(rewards_debt)
        .ok_or(TransformError::Underflow)?;

    Ok(DynSolValue::Uint(pending, 256))
}

fn first_uint(results: &[Vec<DynSolValue>], index: usize) -> Result<U256, TransformError> {
    let value = results[index]
        .first()
        .ok_or(TransformError::MissingValue(index))?;
    value
        .as_uint()
        .map(|(value, _)| value)
        .ok_or(TransformError::NotUint(index))
}

/// Declaration of a compound read panel
#[derive(Debug, Clone)]
pub struct CompoundRead {
    pub name: String,
    pub inputs: Vec<ParamSpec>,
    pub calls: Vec<String>,
    pub transform: Transform,
}

impl CompoundRead {
    pub async fn run<R>(&self, reader: &R, args: &[DynSolValue]) -> Result<DynSolValue, ComposeError>
    where
        R: ContractReader + ?Sized,
    {
        compose(reader, &self.calls, args, &self.transform).await
    }
}

/// Call every function in `calls` in order with the same `args`, then transform
///
/// The calls are strictly sequential. The first failure aborts the run before
/// the transform is invoked.
pub async fn compose<R>(
    reader: &R,
    calls: &[String],
    args: &[DynSolValue],
    transform: &Transform,
) -> Result<DynSolValue, ComposeError>
where
    R: ContractReader + ?Sized,
{
    if calls.is_empty() {
        return Err(ComposeError::NoCalls);
    }

    let mut results = Vec::with_capacity(calls.len());
    for (index, function) in calls.iter().enumerate() {
        let result = reader
            .read(function, args)
            .await
            .map_err(|source| ComposeError::Call {
                index,
                function: function.clone(),
                source,
            })?;
        results.push(result);
    }

    Ok(transform.apply(&results)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn uint(value: u64) -> Vec<DynSolValue> {
        vec![DynSolValue::Uint(U256::from(value), 256)]
    }

    #[test]
    fn test_pending_rewards_documented_example() {
        let results = vec![uint(1000), uint(2_000_000_000_000), uint(500)];
        let value = pending_rewards(&results).unwrap();
        assert_eq!(value, DynSolValue::Uint(U256::from(1500u64), 256));
    }

    #[test]
    fn test_pending_rewards_errors() {
        assert_eq!(
            pending_rewards(&[uint(1), uint(2)]),
            Err(TransformError::Arity {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            pending_rewards(&[uint(1), vec![], uint(0)]),
            Err(TransformError::MissingValue(1))
        );
        assert_eq!(
            pending_rewards(&[uint(1), vec![DynSolValue::Bool(true)], uint(0)]),
            Err(TransformError::NotUint(1))
        );
        assert_eq!(
            pending_rewards(&[uint(0), uint(0), uint(1)]),
            Err(TransformError::Underflow)
        );
    }

    #[test]
    fn test_transform_by_name() {
        assert_eq!(Transform::by_name("pending_rewards").unwrap().name(), "pending_rewards");
        assert!(matches!(
            Transform::by_name("nope"),
            Err(TransformError::Unknown(_))
        ));
    }

    struct CountingReader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContractReader for CountingReader {
        async fn read(&self, _function: &str, _args: &[DynSolValue]) -> anyhow::Result<Vec<DynSolValue>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(uint(n as u64))
        }
    }

    #[tokio::test]
    async fn test_compose_passes_results_in_order() {
        let reader = CountingReader {
            calls: AtomicUsize::new(0),
        };
        let transform = Transform::new("collect", |results: &[Vec<DynSolValue>]| {
            Ok(DynSolValue::Array(
                results.iter().map(|r| r[0].clone()).collect(),
            ))
        });
        let calls = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let value = compose(&reader, &calls, &[], &transform).await.unwrap();
        assert_eq!(
            value,
            DynSolValue::Array(vec![uint(0)[0].clone(), uint(1)[0].clone(), uint(2)[0].clone()])
        );
    }

    #[tokio::test]
    async fn test_compose_without_calls() {
        let reader = CountingReader {
            calls: AtomicUsize::new(0),
        };
        let transform = Transform::by_name("pending_rewards").unwrap();
        assert!(matches!(
            compose(&reader, &[], &[], &transform).await,
            Err(ComposeError::NoCalls)
        ));
    }
}
