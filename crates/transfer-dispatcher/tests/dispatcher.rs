mod fixtures;

use std::time::Duration;

use ethers::types::{Address, U256};
use fixtures::{FakeChain, RecordingPacer, TestContext};
use transfer_dispatcher::config::PHAROS_CHAIN_ID;
use transfer_dispatcher::dispatcher::BalanceCheck;
use transfer_dispatcher::{
    Asset, AssetMetadata, ChainError, DispatchEvent, DispatchSettings, GasSource, OutcomeStatus,
    SignerPool, TokioPacer, TransferDispatcher, TransferPlan,
};

fn native_plan(count: u32) -> TransferPlan {
    TransferPlan {
        asset: Asset::Native,
        metadata: AssetMetadata {
            symbol: "PHRS".to_string(),
            decimals: 18,
        },
        amount: U256::exp10(14),
        transactions_per_recipient: count,
    }
}

fn settings(check_balance: bool) -> DispatchSettings {
    DispatchSettings {
        pacing: Duration::from_millis(300),
        check_balance,
    }
}

#[tokio::test]
async fn test_every_recipient_gets_k_attempts_and_failures_stay_isolated() {
    let ctx = TestContext::new(2, 3);
    ctx.chain.failing_submission(2);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(2),
        settings(false),
    );

    let report = dispatcher
        .dispatch(&pool, &ctx.recipients, |_| {})
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 6);
    assert_eq!(report.submitted(), 5);
    assert_eq!(report.failed(), 1);

    let attempts: Vec<(usize, u32)> = report
        .outcomes
        .iter()
        .map(|o| (o.position, o.attempt))
        .collect();
    assert_eq!(attempts, vec![(0, 1), (0, 2), (1, 1), (1, 2), (2, 1), (2, 2)]);

    // the failed first attempt for recipient 1 does not stop its second attempt
    assert_eq!(
        report.outcomes[2].status,
        OutcomeStatus::Failed(ChainError::Rejected("nonce too low".to_string()))
    );
    assert!(report.outcomes[3].is_submitted());
    assert_eq!(ctx.chain.submissions().len(), 6);
}

#[tokio::test]
async fn test_signers_rotate_by_recipient_position() {
    let ctx = TestContext::new(2, 3);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(1),
        settings(false),
    );

    dispatcher
        .dispatch(&pool, &ctx.recipients, |_| {})
        .await
        .unwrap();

    let pairs: Vec<(Address, Address)> = ctx
        .chain
        .submissions()
        .iter()
        .map(|call| (call.signer, call.to))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (ctx.signer(0), ctx.recipient(0)),
            (ctx.signer(1), ctx.recipient(1)),
            (ctx.signer(0), ctx.recipient(2)),
        ]
    );
}

#[tokio::test]
async fn test_gas_estimation_failure_uses_asset_fallback() {
    let ctx = TestContext::new(1, 1);
    ctx.chain.without_estimation();
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();

    let native = TransferDispatcher::new(
        ctx.chain.clone(),
        RecordingPacer::default(),
        native_plan(1),
        settings(false),
    );
    let report = native.dispatch(&pool, &ctx.recipients, |_| {}).await.unwrap();
    assert_eq!(
        report.outcomes[0].status,
        OutcomeStatus::Submitted {
            tx_hash: ethers::types::H256::from_low_u64_be(1),
            gas_limit: U256::from(21_000u64),
            gas_source: GasSource::Fallback,
        }
    );

    let token = TransferPlan {
        asset: Asset::Erc20 {
            contract: Address::from_low_u64_be(0xabc),
        },
        metadata: AssetMetadata {
            symbol: "USDT".to_string(),
            decimals: 6,
        },
        amount: U256::from(1_000_000u64),
        transactions_per_recipient: 1,
    };
    let erc20 = TransferDispatcher::new(
        ctx.chain.clone(),
        RecordingPacer::default(),
        token,
        settings(false),
    );
    erc20.dispatch(&pool, &ctx.recipients, |_| {}).await.unwrap();

    let gas: Vec<U256> = ctx.chain.submissions().iter().map(|c| c.gas_limit).collect();
    assert_eq!(gas, vec![U256::from(21_000u64), U256::from(70_000u64)]);
}

#[tokio::test]
async fn test_estimated_gas_is_used_as_ceiling() {
    let ctx = TestContext::new(1, 1);
    ctx.chain.with_estimated_gas(U256::from(52_000u64));
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(1),
        settings(false),
    );

    let report = dispatcher
        .dispatch(&pool, &ctx.recipients, |_| {})
        .await
        .unwrap();

    assert!(matches!(
        report.outcomes[0].status,
        OutcomeStatus::Submitted {
            gas_source: GasSource::Estimated,
            ..
        }
    ));
    assert_eq!(ctx.chain.submissions()[0].gas_limit, U256::from(52_000u64));
    assert_eq!(ctx.chain.estimates(), 1);
}

#[tokio::test]
async fn test_pacing_after_every_attempt_and_every_recipient() {
    let ctx = TestContext::new(2, 3);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(2),
        settings(false),
    );

    dispatcher
        .dispatch(&pool, &ctx.recipients, |_| {})
        .await
        .unwrap();

    let pauses = ctx.pacer.pauses();
    // 3 recipients x (2 attempts + 1 trailing pause)
    assert_eq!(pauses.len(), 9);
    assert!(pauses.iter().all(|p| *p == Duration::from_millis(300)));
}

#[tokio::test]
async fn test_low_balance_warns_but_still_sends() {
    let ctx = TestContext::new(2, 2);
    ctx.chain
        .with_balance(ctx.signer(0), U256::exp10(14))
        .with_balance(ctx.signer(1), U256::exp10(18));
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(3),
        settings(true),
    );

    let mut checks = Vec::new();
    let report = dispatcher
        .dispatch(&pool, &ctx.recipients, |event| {
            if let DispatchEvent::Recipient { balance, .. } = event {
                checks.push(balance);
            }
        })
        .await
        .unwrap();

    let required = U256::exp10(14) * U256::from(3u64);
    assert_eq!(
        checks,
        vec![
            Some(BalanceCheck {
                balance: U256::exp10(14),
                required,
            }),
            Some(BalanceCheck {
                balance: U256::exp10(18),
                required,
            }),
        ]
    );
    assert!(!checks[0].unwrap().is_sufficient());
    assert!(checks[1].unwrap().is_sufficient());
    assert_eq!(report.submitted(), 6);
}

#[tokio::test]
async fn test_balance_query_failure_is_ignored() {
    let chain = FakeChain::new();
    let ctx = TestContext::new(1, 1);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        chain.clone(),
        RecordingPacer::default(),
        native_plan(1),
        settings(true),
    );

    let mut checks = Vec::new();
    let report = dispatcher
        .dispatch(&pool, &ctx.recipients, |event| {
            if let DispatchEvent::Recipient { balance, .. } = event {
                checks.push(balance);
            }
        })
        .await
        .unwrap();

    assert_eq!(checks, vec![None]);
    assert_eq!(chain.balance_queries(), 1);
    assert_eq!(report.submitted(), 1);
}

#[tokio::test]
async fn test_events_follow_dispatch_order() {
    let ctx = TestContext::new(1, 2);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        ctx.pacer.clone(),
        native_plan(2),
        settings(false),
    );

    let mut trace = Vec::new();
    dispatcher
        .dispatch(&pool, &ctx.recipients, |event| match event {
            DispatchEvent::Started(plan) => {
                trace.push(format!("start x{}", plan.transactions_per_recipient))
            }
            DispatchEvent::Recipient {
                position, total, ..
            } => trace.push(format!("recipient {position}/{total}")),
            DispatchEvent::Outcome(outcome) => trace.push(format!("tx {}", outcome.attempt)),
        })
        .await
        .unwrap();

    assert_eq!(
        trace,
        vec![
            "start x2",
            "recipient 1/2",
            "tx 1",
            "tx 2",
            "recipient 2/2",
            "tx 1",
            "tx 2"
        ]
    );
    assert_eq!(ctx.chain.balance_queries(), 0);
}

#[tokio::test]
async fn test_huge_transaction_count_starts_sending_immediately() {
    let ctx = TestContext::new(1, 4);
    let pool = SignerPool::new(&ctx.credentials, PHAROS_CHAIN_ID).unwrap();
    let dispatcher = TransferDispatcher::new(
        ctx.chain.clone(),
        TokioPacer,
        native_plan(u32::MAX),
        DispatchSettings {
            pacing: Duration::from_millis(1),
            check_balance: false,
        },
    );

    let unfinished = tokio::time::timeout(
        Duration::from_millis(200),
        dispatcher.dispatch(&pool, &ctx.recipients, |_| {}),
    )
    .await;

    assert!(unfinished.is_err());
    assert!(!ctx.chain.submissions().is_empty());
    assert!(ctx
        .chain
        .submissions()
        .iter()
        .all(|call| call.to == ctx.recipient(0)));
}
