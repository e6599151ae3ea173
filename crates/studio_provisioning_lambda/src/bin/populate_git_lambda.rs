use aws_sdk_sagemaker::error::DisplayErrorContext;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use studio_provisioning_lambda::adapters::git::GitCliTransport;
use studio_provisioning_lambda::adapters::ownership::UnixOwnership;
use studio_provisioning_lambda::adapters::response::HttpResponseSender;
use studio_provisioning_lambda::adapters::user_profiles::UserProfileRegistry;
use studio_provisioning_lambda::config::{GitPopulationConfig, ResponseMode};
use studio_provisioning_lambda::handlers::populate_git::PopulateGitHandler;
use studio_provisioning_lambda::handlers::protocol::complete_invocation;
use studio_provisioning_lambda::telemetry;

struct SageMakerUserProfiles {
    sagemaker_client: aws_sdk_sagemaker::Client,
}

impl UserProfileRegistry for SageMakerUserProfiles {
    fn home_storage_identity(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<String, String> {
        let client = self.sagemaker_client.clone();
        let domain_id = domain_id.to_string();
        let user_profile_name = user_profile_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .describe_user_profile()
                    .domain_id(&domain_id)
                    .user_profile_name(&user_profile_name)
                    .send()
                    .await
                    .map_err(|error| {
                        format!(
                            "failed to describe user profile: {}",
                            DisplayErrorContext(&error)
                        )
                    })?;

                output
                    .home_efs_file_system_uid()
                    .map(str::to_string)
                    .ok_or_else(|| "user profile has no home EFS uid assigned yet".to_string())
            })
        })
    }
}

struct RuntimeDependencies {
    config: GitPopulationConfig,
    response_mode: ResponseMode,
    user_profiles: SageMakerUserProfiles,
    git: GitCliTransport,
    ownership: UnixOwnership,
    response_sender: HttpResponseSender,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<Value, Error> {
    let handler = PopulateGitHandler {
        config: &deps.config,
        user_profiles: &deps.user_profiles,
        git: &deps.git,
        ownership: &deps.ownership,
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

    let config = GitPopulationConfig::from_env().map_err(Error::from)?;
    let response_mode = ResponseMode::from_env().map_err(Error::from)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let deps = RuntimeDependencies {
        git: GitCliTransport::new(config.git_binary.clone(), config.clone_depth),
        config,
        response_mode,
        user_profiles: SageMakerUserProfiles {
            sagemaker_client: aws_sdk_sagemaker::Client::new(&aws_config),
        },
        ownership: UnixOwnership,
        response_sender: HttpResponseSender::new(),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}
