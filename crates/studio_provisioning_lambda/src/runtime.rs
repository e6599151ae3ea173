pub use studio_provisioning_core::{
    cfn_response, contract, error, home_layout, lifecycle, portfolio,
};
