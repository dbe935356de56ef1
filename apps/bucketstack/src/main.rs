//! BucketStack - synthesizes the IP-restricted asset bucket stack.
//!
//! Reads the stack configuration from the environment, computes the bucket,
//! its resource policy and the asset deployment, writes the rendered
//! template for the provisioning engine, and prints the stack output.
//!
//! # Usage
//!
//! ```text
//! PREFIX=acme STAGE=dev BUCKET_NAME=assets WHITE_LIST_IP='["10.0.0.0/8"]' bucketstack
//! ```
//!
//! Pass `--print-template` to write the template to stdout instead of
//! `OUTPUT_DIR`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PREFIX` | `[STACK PREFIX NAME]` | Naming prefix |
//! | `STAGE` | `[DEPLOYMENT STAGE]` | Deployment stage |
//! | `CDK_ACCOUNT` | `[AWS ACCOUNT ID]` | Target account |
//! | `CDK_REGION` | `ap-southeast-1` | Target region |
//! | `BUCKET_NAME` | *(empty)* | Bucket name suffix |
//! | `WHITE_LIST_IP` | `[]` | JSON array of allowed CIDR blocks |
//! | `ASSET_SOURCE` | `./src/s3` | Directory deployed into the bucket |
//! | `REMOVAL_POLICY` | `destroy` | `destroy` or `retain` |
//! | `OUTPUT_DIR` | `stack.out` | Where the template is written |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bucketstack_core::{BucketProvisioner, StackConfig, StackOutput, render_template};

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout only carries the stack output.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Where the rendered template goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSink {
    /// `<dir>/<stack name>.template.json`
    Dir(PathBuf),
    /// Standard output.
    Stdout,
}

/// Result of a successful run.
#[derive(Debug)]
struct Synthesized {
    output: StackOutput,
    template: String,
    template_path: Option<PathBuf>,
}

/// Compute the stack and emit its template.
///
/// Configuration errors abort before anything is written.
fn synthesize(config: &StackConfig, sink: &TemplateSink) -> Result<Synthesized> {
    let request = config.request().context("failed to parse stack configuration")?;
    let provisioner = BucketProvisioner::new(config.identity());
    let stack = provisioner
        .provision(&request)
        .context("failed to compute stack description")?;

    let template = serde_json::to_string_pretty(&render_template(&stack))
        .context("failed to serialize template")?;

    let template_path = match sink {
        TemplateSink::Dir(dir) => {
            let path = template_path(dir, &provisioner.identity().stack_name());
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;
            fs::write(&path, &template)
                .with_context(|| format!("failed to write template {}", path.display()))?;
            info!(path = %path.display(), "wrote stack template");
            Some(path)
        }
        TemplateSink::Stdout => None,
    };

    Ok(Synthesized {
        output: stack.output,
        template,
        template_path,
    })
}

fn template_path(dir: &Path, stack_name: &str) -> PathBuf {
    dir.join(format!("{stack_name}.template.json"))
}

fn main() -> Result<()> {
    let config = StackConfig::from_env();

    init_tracing(&config.log_level)?;

    let sink = if std::env::args().any(|a| a == "--print-template") {
        TemplateSink::Stdout
    } else {
        TemplateSink::Dir(PathBuf::from(&config.output_dir))
    };

    info!(
        prefix = %config.prefix,
        stage = %config.stage,
        region = %config.region,
        asset_source = %config.asset_source,
        version = VERSION,
        "synthesizing bucket stack",
    );

    let synthesized = match synthesize(&config, &sink) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %format!("{e:#}"), "stack synthesis failed");
            return Err(e);
        }
    };

    if sink == TemplateSink::Stdout {
        println!("{}", synthesized.template);
    } else if let Some(path) = &synthesized.template_path {
        info!(path = %path.display(), "template ready for the provisioning engine");
    }
    println!("{} = {}", StackOutput::NAME, synthesized.output.bucket_arn);

    Ok(())
}
