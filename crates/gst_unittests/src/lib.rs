#[cfg(test)]
mod unittests;

#[cfg(test)]
mod tests {
    use gst_chainbase::{Database, UndoSession};
    use gst_core::{
        ChainError, ResourceLimitsManager,
        name::Name,
        resource::{ResourceLimitsConfig, ResourceLimitsState},
    };

    /// Test fixture owning a temporary database with an initialized resource
    /// limits subsystem and one long-lived session that plays the role of
    /// the chain's block application loop.
    pub struct Testing {
        pub db: Database,
        pub session: UndoSession,
        _temp_dir: tempfile::TempDir,
    }

    impl Testing {
        pub fn new() -> Self {
            let mut suite = Self::empty();
            ResourceLimitsManager::initialize_database(&mut suite.session)
                .expect("failed to initialize resource limits");
            suite
        }

        /// A fixture without the genesis rows, for snapshot restores.
        pub fn empty() -> Self {
            let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
            let db = Database::temporary(temp_dir.path()).expect("failed to create database");
            let session = db.undo_session().expect("failed to create session");
            Testing {
                db,
                session,
                _temp_dir: temp_dir,
            }
        }

        pub fn create_accounts(&mut self, accounts: Vec<Name>) -> Result<(), ChainError> {
            for account in accounts {
                ResourceLimitsManager::initialize_account(&mut self.session, account)?;
            }
            Ok(())
        }

        /// Re-genesis with test-sized block limits and account windows:
        /// rewrites the config row and restarts the virtual limits at the
        /// new maximums.
        pub fn configure_limits(
            &mut self,
            max: u64,
            target: u64,
            account_window: u32,
        ) -> Result<(), ChainError> {
            let mut config = self.session.get::<ResourceLimitsConfig>(0)?;
            self.session.modify(&mut config, |c| {
                c.cpu_limit_parameters.max = max;
                c.cpu_limit_parameters.target = target;
                c.net_limit_parameters.max = max;
                c.net_limit_parameters.target = target;
                c.account_cpu_usage_average_window = account_window;
                c.account_net_usage_average_window = account_window;
            })?;

            let mut state = self.session.get::<ResourceLimitsState>(0)?;
            self.session.modify(&mut state, |s| {
                s.virtual_cpu_limit = max;
                s.virtual_net_limit = max;
            })?;
            Ok(())
        }

        /// Stages the given weights and collapses them immediately, the way
        /// a block boundary would.
        pub fn commit_account_limits(
            &mut self,
            account: Name,
            ram_bytes: i64,
            net_weight: i64,
            cpu_weight: i64,
        ) -> Result<(), ChainError> {
            ResourceLimitsManager::set_account_limits(
                &mut self.session,
                account,
                ram_bytes,
                net_weight,
                cpu_weight,
            )?;
            ResourceLimitsManager::process_account_limit_updates(&mut self.session)?;
            Ok(())
        }
    }
}
