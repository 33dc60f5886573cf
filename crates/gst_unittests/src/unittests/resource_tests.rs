#[cfg(test)]
mod resource_tests {
    use std::collections::BTreeSet;

    use anyhow::Result;
    use gst_core::{
        ChainError, ResourceLimitsManager,
        name::Name,
        resource::{ResourceLimits, ResourceUsage},
        utils::make_ratio,
    };
    use gst_proc_macros::name;

    use crate::tests::Testing;

    const ALICE: Name = Name::new(name!("alice"));
    const BOB: Name = Name::new(name!("bob"));

    fn one(account: Name) -> BTreeSet<Name> {
        BTreeSet::from([account])
    }

    /// Block max 1000, window 60 slots, alice entitled to 1/200th of the
    /// virtual capacity in the window: 1000 * 60 / 200 = 300.
    fn fair_share_chain() -> Result<Testing> {
        let mut chain = Testing::new();
        chain.configure_limits(1000, 100, 60)?;
        chain.create_accounts(vec![ALICE, BOB])?;
        chain.commit_account_limits(ALICE, -1, 1, 1)?;
        chain.commit_account_limits(BOB, -1, 199, 199)?;
        Ok(chain)
    }

    #[test]
    fn test_account_share_enforced() -> Result<()> {
        let mut chain = fair_share_chain()?;

        // exactly the share passes
        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 0, 1)?;

        // one more unit in the same window goes over
        let err = ResourceLimitsManager::add_transaction_usage(
            &mut chain.session,
            &one(ALICE),
            1,
            0,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::TxCpuUsageExceeded(_)));
        Ok(())
    }

    #[test]
    fn test_usage_survives_failed_admission() -> Result<()> {
        let mut chain = fair_share_chain()?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 0, 1)?;
        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 1, 0, 1)
            .unwrap_err();

        // the accumulator kept the over-budget sample; only a session
        // rollback can shed it. The accessor reports ceiling-divided usage,
        // so both samples round up: ceil(5_016_667 * 60 / 1_000_000) = 302.
        let arl = ResourceLimitsManager::get_account_cpu_limit_ex(
            &mut chain.session,
            ALICE,
            true,
            None,
        )?;
        assert_eq!(arl.used, 302);
        assert_eq!(arl.max, 300);
        assert_eq!(arl.available, 0);
        Ok(())
    }

    #[test]
    fn test_net_share_enforced() -> Result<()> {
        let mut chain = fair_share_chain()?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 0, 300, 1)?;
        let err = ResourceLimitsManager::add_transaction_usage(
            &mut chain.session,
            &one(ALICE),
            0,
            1,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::TxNetUsageExceeded(_)));
        Ok(())
    }

    #[test]
    fn test_usage_decays_across_window() -> Result<()> {
        let mut chain = fair_share_chain()?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 0, 1)?;
        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 1, 0, 1)
            .unwrap_err();

        // a full window later the average has decayed to nothing and the
        // full share is available again
        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 0, 61)?;
        Ok(())
    }

    #[test]
    fn test_update_account_usage_ages_average() -> Result<()> {
        let mut chain = fair_share_chain()?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 0, 1)?;
        // half a window with no usage halves the average
        ResourceLimitsManager::update_account_usage(&mut chain.session, &one(ALICE), 31)?;

        let arl = ResourceLimitsManager::get_account_cpu_limit_ex(
            &mut chain.session,
            ALICE,
            true,
            None,
        )?;
        assert_eq!(arl.used, 150);
        assert_eq!(arl.available, 150);
        Ok(())
    }

    #[test]
    fn test_unlimited_sentinel() -> Result<()> {
        let mut chain = Testing::new();
        chain.configure_limits(1000, 100, 60)?;
        chain.create_accounts(vec![ALICE, BOB])?;
        // bob carries all the weight; alice keeps the schema default of -1
        chain.commit_account_limits(BOB, -1, 100, 100)?;

        for slot in 1..=20u64 {
            ResourceLimitsManager::add_transaction_usage(
                &mut chain.session,
                &one(ALICE),
                900,
                900,
                slot,
            )?;
            ResourceLimitsManager::process_block_usage(&mut chain.session, slot)?;
        }

        let arl = ResourceLimitsManager::get_account_cpu_limit_ex(
            &mut chain.session,
            ALICE,
            true,
            None,
        )?;
        assert_eq!((arl.used, arl.available, arl.max), (-1, -1, -1));
        Ok(())
    }

    #[test]
    fn test_block_resource_exhausted() -> Result<()> {
        let mut chain = Testing::new();
        chain.configure_limits(1000, 100, 60)?;
        chain.create_accounts(vec![ALICE])?;

        let err = ResourceLimitsManager::add_transaction_usage(
            &mut chain.session,
            &one(ALICE),
            1001,
            0,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::BlockResourceExhausted(_)));

        // the account's accumulator was still charged before the block
        // check tripped
        let usage = chain.session.get::<ResourceUsage>(ALICE)?;
        assert_eq!(usage.cpu_usage.consumed, 1001);
        Ok(())
    }

    #[test]
    fn test_block_limit_accounts_for_pending_usage() -> Result<()> {
        let mut chain = Testing::new();
        chain.configure_limits(1000, 100, 60)?;
        chain.create_accounts(vec![ALICE])?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 300, 250, 1)?;
        assert_eq!(
            ResourceLimitsManager::get_block_cpu_limit(&mut chain.session)?,
            700
        );
        assert_eq!(
            ResourceLimitsManager::get_block_net_limit(&mut chain.session)?,
            750
        );
        Ok(())
    }

    #[test]
    fn test_process_block_usage_rolls_up_and_expands() -> Result<()> {
        let mut chain = Testing::new();
        chain.configure_limits(1000, 100, 60)?;
        chain.create_accounts(vec![ALICE])?;

        ResourceLimitsManager::add_transaction_usage(&mut chain.session, &one(ALICE), 400, 400, 1)?;
        ResourceLimitsManager::process_block_usage(&mut chain.session, 1)?;

        // pending usage folded into the average and reset
        assert_eq!(
            ResourceLimitsManager::get_block_cpu_limit(&mut chain.session)?,
            1000
        );
        // uncongested: the virtual limit expands by expand_rate off its floor
        assert_eq!(
            ResourceLimitsManager::get_virtual_block_cpu_limit(&mut chain.session)?,
            1000 * 1000 / 999
        );
        assert_eq!(
            ResourceLimitsManager::get_virtual_block_net_limit(&mut chain.session)?,
            1000 * 1000 / 999
        );
        Ok(())
    }

    #[test]
    fn test_virtual_limit_floors_at_max_under_congestion() -> Result<()> {
        let mut chain = Testing::new();
        // target of 1 unit per block: any activity is congestion
        chain.configure_limits(1000, 1, 60)?;
        chain.create_accounts(vec![ALICE])?;

        for slot in 1..=10u64 {
            ResourceLimitsManager::add_transaction_usage(
                &mut chain.session,
                &one(ALICE),
                900,
                900,
                slot,
            )?;
            ResourceLimitsManager::process_block_usage(&mut chain.session, slot)?;
        }

        // contraction can never push the virtual limit below the nominal max
        assert_eq!(
            ResourceLimitsManager::get_virtual_block_cpu_limit(&mut chain.session)?,
            1000
        );
        Ok(())
    }

    #[test]
    fn test_weight_handoff_updates_totals() -> Result<()> {
        let mut chain = Testing::new();
        chain.create_accounts(vec![ALICE, BOB])?;
        chain.commit_account_limits(ALICE, -1, 100, 100)?;
        chain.commit_account_limits(BOB, -1, 100, 100)?;

        let state = chain
            .session
            .get::<gst_core::resource::ResourceLimitsState>(0)?;
        assert_eq!(state.total_cpu_weight, 200);
        assert_eq!(state.total_net_weight, 200);

        // stage both changes, collapse them in one boundary pass
        ResourceLimitsManager::set_account_limits(&mut chain.session, ALICE, -1, 50, 50)?;
        ResourceLimitsManager::set_account_limits(&mut chain.session, BOB, -1, 0, 0)?;
        ResourceLimitsManager::process_account_limit_updates(&mut chain.session)?;

        let state = chain
            .session
            .get::<gst_core::resource::ResourceLimitsState>(0)?;
        assert_eq!(state.total_cpu_weight, 50);
        assert_eq!(state.total_net_weight, 50);

        // pending rows are gone, committed rows carry the new weights
        assert!(
            chain
                .session
                .find::<ResourceLimits>((true, ALICE))?
                .is_none()
        );
        assert!(chain.session.find::<ResourceLimits>((true, BOB))?.is_none());
        let committed = chain.session.get::<ResourceLimits>((false, ALICE))?;
        assert_eq!(committed.cpu_weight, 50);
        Ok(())
    }

    #[test]
    fn test_ram_limit_enforced_at_verify() -> Result<()> {
        let mut chain = Testing::new();
        chain.create_accounts(vec![ALICE])?;
        chain.commit_account_limits(ALICE, 1000, -1, -1)?;

        // the delta lands unconditionally; the verify step catches the
        // overcommit
        ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, 1500)?;
        let err =
            ResourceLimitsManager::verify_account_ram_usage(&mut chain.session, ALICE).unwrap_err();
        assert!(matches!(err, ChainError::RamUsageExceeded(_)));

        ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, -500)?;
        ResourceLimitsManager::verify_account_ram_usage(&mut chain.session, ALICE)?;
        assert_eq!(
            ResourceLimitsManager::get_account_ram_usage(&mut chain.session, ALICE)?,
            1000
        );
        Ok(())
    }

    #[test]
    fn test_ram_usage_bounds_checked() -> Result<()> {
        let mut chain = Testing::new();
        chain.create_accounts(vec![ALICE])?;

        let err = ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, -1)
            .unwrap_err();
        assert!(matches!(err, ChainError::RamUsageUnderflow(_)));
        assert_eq!(
            ResourceLimitsManager::get_account_ram_usage(&mut chain.session, ALICE)?,
            0
        );

        ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, i64::MAX)?;
        ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, i64::MAX)?;
        let err = ResourceLimitsManager::add_pending_ram_usage(&mut chain.session, ALICE, 2)
            .unwrap_err();
        assert!(matches!(err, ChainError::RamUsageOverflow(_)));

        // the failed delta left the usage untouched
        let usage = chain.session.get::<ResourceUsage>(ALICE)?;
        assert_eq!(usage.ram_usage, u64::MAX - 1);
        Ok(())
    }

    #[test]
    fn test_initialize_account_twice_fails() -> Result<()> {
        let mut chain = Testing::new();
        chain.create_accounts(vec![ALICE])?;
        let err = ResourceLimitsManager::initialize_account(&mut chain.session, ALICE).unwrap_err();
        assert!(matches!(err, ChainError::AccountAlreadyExists(_)));
        Ok(())
    }

    #[test]
    fn test_set_account_limits_decrease_flag() -> Result<()> {
        let mut chain = Testing::new();
        chain.create_accounts(vec![ALICE])?;

        // any finite limit is a decrease from the unlimited default
        assert!(ResourceLimitsManager::set_account_limits(
            &mut chain.session,
            ALICE,
            1000,
            -1,
            -1
        )?);
        assert!(!ResourceLimitsManager::set_account_limits(
            &mut chain.session,
            ALICE,
            2000,
            -1,
            -1
        )?);
        assert!(ResourceLimitsManager::set_account_limits(
            &mut chain.session,
            ALICE,
            500,
            -1,
            -1
        )?);
        Ok(())
    }

    #[test]
    fn test_set_block_parameters_validation() -> Result<()> {
        let mut chain = Testing::new();

        let good = gst_core::resource::ElasticLimitParameters::new(
            100,
            1000,
            120,
            1000,
            make_ratio(99, 100),
            make_ratio(1000, 999),
        );
        ResourceLimitsManager::set_block_parameters(&mut chain.session, good.clone(), good.clone())?;

        let mut bad = good.clone();
        bad.expand_rate = make_ratio(1000, 0);
        let err =
            ResourceLimitsManager::set_block_parameters(&mut chain.session, good, bad).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
        Ok(())
    }
}
