//! Dashboard flow without the terminal: keys in, worker commands out,
//! worker events back into the panels

use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use alloy_dyn_abi::DynSolValue;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use valdash::app::{App, AppOptions, ContractState};
use valdash::config::Config;
use valdash::domain::abi::{
    ContractDescriptor, DescriptorSource, FunctionDescriptor, ParamSpec, StateMutability,
};
use valdash::infrastructure::ethereum::{ReceiptOutcome, Session, SignerKind};
use valdash::infrastructure::runtime::{RuntimeCommand, RuntimeEvent};
use valdash::modules::PanelStatus;

const MINER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

fn validators() -> ContractDescriptor {
    let address = || vec![ParamSpec::new("_val", "address")];
    let uint = || vec![ParamSpec::new("", "uint256")];
    ContractDescriptor {
        name: "Validators".to_string(),
        address: "0x000000000000000000000000000000000000f333".to_string(),
        chain_id: 321,
        functions: vec![
            FunctionDescriptor::function("getPoolSelfBallots", address(), uint(), StateMutability::View),
            FunctionDescriptor::function("getPoolaccRewardPerShare", address(), uint(), StateMutability::View),
            FunctionDescriptor::function(
                "getPoolSelfBallotsRewardsDebt",
                address(),
                uint(),
                StateMutability::View,
            ),
            FunctionDescriptor::function("depositMargin", address(), vec![], StateMutability::Payable),
            FunctionDescriptor::function(
                "claimSelfBallotsReward",
                address(),
                vec![],
                StateMutability::NonPayable,
            ),
        ],
        source: DescriptorSource::External(PathBuf::from("Validators.json")),
    }
}

fn signer_session() -> Session {
    Session {
        address: Some(Address::repeat_byte(0x42)),
        chain_id: 321,
        balance: None,
        signer: SignerKind::LocalKey,
    }
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_panel_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn connected(page: usize) -> App {
    let mut app = App::new(Config::default(), AppOptions::default());
    app.take_commands();
    app.select_page(page);
    let epoch = app.epoch;
    app.apply_event(RuntimeEvent::SessionChanged {
        epoch,
        endpoint: "https://rpc-mainnet.kcc.network".to_string(),
        session: signer_session(),
    });
    app.apply_event(RuntimeEvent::ContractLoaded {
        epoch,
        contract: Some(validators()),
        deployed: true,
        errors: vec![],
    });
    app.take_commands();
    app
}

#[test]
fn test_rewards_page_compound_flow() {
    let mut app = connected(1);
    assert_eq!(app.contract_state, ContractState::Deployed);
    let titles: Vec<&str> = app.panels.iter().map(|slot| slot.panel.title()).collect();
    assert_eq!(titles, vec!["claimSelfBallotsReward", "Rewards Amount"]);

    app.selected = 1;
    app.activate_selected();
    assert!(app.is_editing());
    type_text(&mut app, MINER);
    press(&mut app, KeyCode::Enter);

    let commands = app.take_commands();
    let (epoch, panel) = match commands.as_slice() {
        [RuntimeCommand::Compound {
            epoch,
            panel,
            read,
            args,
        }] => {
            assert_eq!(read.calls.len(), 3);
            assert_eq!(read.transform.name(), "pending_rewards");
            assert_eq!(
                args,
                &vec![DynSolValue::Address(MINER.parse::<Address>().unwrap())]
            );
            (*epoch, *panel)
        }
        other => panic!("expected one compound command, got {other:?}"),
    };
    assert!(app.panels[1].panel.status().is_loading());

    app.apply_event(RuntimeEvent::CompoundDone {
        epoch,
        panel,
        name: "Rewards Amount".to_string(),
        outcome: Ok(DynSolValue::Uint(U256::from(1500u64), 256)),
    });
    assert_eq!(app.panels[1].panel.output(), Some("1500"));
    assert_eq!(app.panels[1].panel.status(), &PanelStatus::Displayed);

    // A later failure keeps the last value
    app.activate_selected();
    type_text(&mut app, MINER);
    press(&mut app, KeyCode::Enter);
    app.take_commands();
    app.apply_event(RuntimeEvent::CompoundDone {
        epoch,
        panel,
        name: "Rewards Amount".to_string(),
        outcome: Err("call 1 (getPoolaccRewardPerShare) failed".to_string()),
    });
    assert_eq!(app.panels[1].panel.output(), Some("1500"));
    assert!(matches!(app.panels[1].panel.status(), PanelStatus::Error(_)));
}

#[test]
fn test_margin_page_payable_write_flow() {
    let mut app = connected(0);
    app.gas_price = Some(1_000_000_000);
    let index = app
        .panels
        .iter()
        .position(|slot| slot.panel.title() == "depositMargin")
        .unwrap();
    app.selected = index;

    app.activate_selected();
    type_text(&mut app, MINER);
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "1000");
    press(&mut app, KeyCode::Enter);

    let commands = app.take_commands();
    let (epoch, panel) = match commands.as_slice() {
        [RuntimeCommand::Write {
            epoch,
            panel,
            function,
            value,
            gas_price,
            ..
        }] => {
            assert_eq!(function, "depositMargin");
            assert_eq!(*value, Some(U256::from(1000u64)));
            assert_eq!(*gas_price, Some(1_000_000_000));
            (*epoch, *panel)
        }
        other => panic!("expected one write command, got {other:?}"),
    };

    app.apply_event(RuntimeEvent::TxSubmitted {
        epoch,
        panel,
        function: "depositMargin".to_string(),
        hash: "0xabc".to_string(),
    });
    app.apply_event(RuntimeEvent::TxMined {
        epoch,
        panel,
        function: "depositMargin".to_string(),
        hash: "0xabc".to_string(),
        outcome: ReceiptOutcome {
            success: true,
            block_number: Some(77),
            gas_used: 42_000,
        },
    });

    assert_eq!(app.panels[index].panel.status(), &PanelStatus::Displayed);
    let log: Vec<&str> = app.activity.iter().map(|entry| entry.text.as_str()).collect();
    assert!(log.iter().any(|line| line.contains("depositMargin: submitted 0xabc")));
    assert!(log.iter().any(|line| line.contains("depositMargin: confirmed in block 77")));
    // A confirmed write re-queries the display elements
    assert!(app
        .take_commands()
        .iter()
        .all(|command| matches!(command, RuntimeCommand::Read { .. })));
}

#[test]
fn test_page_switch_drops_answers_for_old_panels() {
    let mut app = connected(0);
    let old_ids: Vec<_> = app.panels.iter().map(|slot| slot.id).collect();
    let epoch = app.epoch;

    app.select_page(2);
    let new_ids: Vec<_> = app.panels.iter().map(|slot| slot.id).collect();
    assert!(new_ids.iter().all(|id| !old_ids.contains(id)));

    app.apply_event(RuntimeEvent::ReadDone {
        epoch,
        panel: old_ids[0],
        function: "getPoolSelfBallots".to_string(),
        outcome: Ok(vec![DynSolValue::Uint(U256::from(9u64), 256)]),
    });
    assert!(app.panels.iter().all(|slot| slot.panel.output().is_none()));
}
