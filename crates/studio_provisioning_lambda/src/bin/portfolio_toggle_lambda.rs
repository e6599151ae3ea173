use aws_sdk_servicecatalog::error::DisplayErrorContext;
use aws_sdk_servicecatalog::types::PrincipalType;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use studio_provisioning_lambda::adapters::portfolio::PortfolioRegistry;
use studio_provisioning_lambda::adapters::response::HttpResponseSender;
use studio_provisioning_lambda::config::{PortfolioToggleConfig, ResponseMode};
use studio_provisioning_lambda::handlers::portfolio_toggle::PortfolioToggleHandler;
use studio_provisioning_lambda::handlers::protocol::complete_invocation;
use studio_provisioning_lambda::runtime::portfolio::PortfolioShare;
use studio_provisioning_lambda::telemetry;

struct ServiceCatalogPortfolios {
    sagemaker_client: aws_sdk_sagemaker::Client,
    service_catalog_client: aws_sdk_servicecatalog::Client,
}

impl PortfolioRegistry for ServiceCatalogPortfolios {
    fn enable_portfolio_integration(&self) -> Result<(), String> {
        let client = self.sagemaker_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .enable_sagemaker_servicecatalog_portfolio()
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to enable SageMaker Service Catalog portfolio: {}",
                            aws_sdk_sagemaker::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }

    fn disable_portfolio_integration(&self) -> Result<(), String> {
        let client = self.sagemaker_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .disable_sagemaker_servicecatalog_portfolio()
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to disable SageMaker Service Catalog portfolio: {}",
                            aws_sdk_sagemaker::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }

    fn list_accepted_portfolio_shares(&self) -> Result<Vec<PortfolioShare>, String> {
        let client = self.service_catalog_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut shares = Vec::new();
                let mut page_token: Option<String> = None;

                loop {
                    let output = client
                        .list_accepted_portfolio_shares()
                        .set_page_token(page_token.take())
                        .send()
                        .await
                        .map_err(|error| {
                            format!(
                                "failed to list accepted portfolio shares: {}",
                                DisplayErrorContext(&error)
                            )
                        })?;

                    for detail in output.portfolio_details() {
                        shares.push(PortfolioShare {
                            id: detail.id().unwrap_or_default().to_string(),
                            provider_name: detail.provider_name().unwrap_or_default().to_string(),
                        });
                    }

                    match output.next_page_token() {
                        Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                        _ => break,
                    }
                }

                Ok(shares)
            })
        })
    }

    fn associate_principal(&self, portfolio_id: &str, principal_arn: &str) -> Result<(), String> {
        let client = self.service_catalog_client.clone();
        let portfolio_id = portfolio_id.to_string();
        let principal_arn = principal_arn.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .associate_principal_with_portfolio()
                    .portfolio_id(portfolio_id)
                    .principal_arn(principal_arn)
                    .principal_type(PrincipalType::Iam)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to associate principal with portfolio: {}",
                            DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }

    fn disassociate_principal(
        &self,
        portfolio_id: &str,
        principal_arn: &str,
    ) -> Result<(), String> {
        let client = self.service_catalog_client.clone();
        let portfolio_id = portfolio_id.to_string();
        let principal_arn = principal_arn.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .disassociate_principal_from_portfolio()
                    .portfolio_id(portfolio_id)
                    .principal_arn(principal_arn)
                    .principal_type(PrincipalType::Iam)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to disassociate principal from portfolio: {}",
                            DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct RuntimeDependencies {
    config: PortfolioToggleConfig,
    response_mode: ResponseMode,
    registry: ServiceCatalogPortfolios,
    response_sender: HttpResponseSender,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<Value, Error> {
    let handler = PortfolioToggleHandler {
        config: &deps.config,
        registry: &deps.registry,
    };

    complete_invocation(
        event.payload,
        &handler,
        deps.response_mode,
        &deps.response_sender,
        &event.context.env_config.log_stream,
    )
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let response_mode = ResponseMode::from_env().map_err(Error::from)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let deps = RuntimeDependencies {
        config: PortfolioToggleConfig::from_env(),
        response_mode,
        registry: ServiceCatalogPortfolios {
            sagemaker_client: aws_sdk_sagemaker::Client::new(&aws_config),
            service_catalog_client: aws_sdk_servicecatalog::Client::new(&aws_config),
        },
        response_sender: HttpResponseSender::new(),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}
