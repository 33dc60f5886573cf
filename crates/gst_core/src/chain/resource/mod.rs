mod account_resource_limit;
pub use account_resource_limit::AccountResourceLimit;

mod elastic_limit_parameters;
pub use elastic_limit_parameters::ElasticLimitParameters;

mod resource_limits_config;
pub use resource_limits_config::ResourceLimitsConfig;

mod resource_limits_state;
pub use resource_limits_state::ResourceLimitsState;

mod resource_limits;
pub use resource_limits::ResourceLimits;

mod resource_usage;
pub use resource_usage::ResourceUsage;

mod resource_gas;
pub use resource_gas::ResourceGas;

mod resource_gas_activation;
pub use resource_gas_activation::ResourceGasActivation;
