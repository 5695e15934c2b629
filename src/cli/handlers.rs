//! Subcommand handlers. Thin presentation layer over the library:
//! resolve arguments into [`BuildOptions`], call the orchestrator,
//! render the outcome, return an exit code.

use super::commands::{BuildArgs, DetectArgs, DoctorArgs};
use crate::detect::DetectorRegistry;
use crate::env::OfflineEnvironment;
use crate::options::{BuildOptions, ReleaseCredentials, SignMode};
use crate::orchestrator::BuildOrchestrator;
use crate::progress::LoggingHandler;
use crate::util::fs::sanitize_name;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

pub async fn handle_detect(args: &DetectArgs) -> i32 {
    let path = resolve_path(args.path.clone());
    let registry = DetectorRegistry::with_defaults();
    let info = registry.resolve(&path);

    if args.json {
        match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                error!(error = %err, "failed to serialize detection");
                return 1;
            }
        }
    } else {
        println!("type:        {}", info.project_type);
        println!("confidence:  {}", info.confidence);
        println!("name:        {}", info.suggested_name);
        for evidence in &info.evidence {
            println!("evidence:    {}", evidence.display());
        }
        if args.all {
            println!();
            for (project_type, confidence) in registry.resolve_all(&path) {
                println!("{:<10} {}", project_type.to_string(), confidence);
            }
        }
    }
    0
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    let path = resolve_path(args.path.clone());
    let env = OfflineEnvironment::resolve(&args.toolchains);
    let orchestrator = BuildOrchestrator::new(env);

    let options = match build_options(args, &orchestrator, &path) {
        Ok(options) => options,
        Err(message) => {
            error!("{}", message);
            return 2;
        }
    };

    let result = orchestrator
        .build(&path, options, Some(Arc::new(LoggingHandler)), None)
        .await;

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    if result.success {
        if let Some(apk) = &result.apk_path {
            println!("{}", apk.display());
        }
        0
    } else {
        for err in &result.errors {
            eprintln!("error: {}", err);
        }
        1
    }
}

pub async fn handle_doctor(args: &DoctorArgs) -> i32 {
    let env = OfflineEnvironment::resolve(&args.toolchains);
    let report = env.verify();

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                error!(error = %err, "failed to serialize report");
                return 1;
            }
        }
    } else if report.valid {
        println!("all toolchains present under {}", env.base().display());
    } else {
        println!("missing toolchains under {}:", env.base().display());
        for role in &report.missing {
            println!("  {}  ({})", role, env.root(*role).display());
        }
    }

    if report.valid {
        0
    } else {
        1
    }
}

fn resolve_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn build_options(
    args: &BuildArgs,
    orchestrator: &BuildOrchestrator,
    path: &PathBuf,
) -> Result<BuildOptions, String> {
    let info = orchestrator.detect_project(path);
    let app_name = args
        .app_name
        .clone()
        .unwrap_or_else(|| info.suggested_name.clone());
    let package_name = args
        .package_name
        .clone()
        .unwrap_or_else(|| format!("com.apkforge.{}", sanitize_name(&app_name).to_lowercase()));

    let mut options = BuildOptions::named(app_name, package_name);
    options.version_name = args.version_name.clone();
    options.version_code = args.version_code;
    options.icon_source = args.icon.clone();
    options.shrink = args.shrink;
    options.output_dir = args.output.clone();
    options.permissions.extend(args.permissions.iter().cloned());

    if args.release {
        options.sign_mode = SignMode::Release;
        match (&args.keystore, &args.store_pass, &args.key_pass, &args.key_alias) {
            (Some(keystore), Some(store_pass), Some(key_pass), Some(key_alias)) => {
                options.release_credentials = Some(ReleaseCredentials {
                    keystore: keystore.clone(),
                    store_pass: store_pass.clone(),
                    key_pass: key_pass.clone(),
                    key_alias: key_alias.clone(),
                });
            }
            _ => {
                return Err(
                    "release builds need --keystore, --store-pass, --key-pass and --key-alias"
                        .to_string(),
                )
            }
        }
    }

    Ok(options)
}
