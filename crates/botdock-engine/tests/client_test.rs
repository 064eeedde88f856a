use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use botdock_core::{Credential, PipelineState, SecretDelivery, StagePaths};
use botdock_engine::audit::{AuditError, AuditExpectation, audit_image};
use botdock_engine::client::{BuildRequest, DockerClient, RunRequest};
use botdock_engine::docker::DockerError;
use botdock_engine::executor::DockerExecutor;
use botdock_engine::runner::{BuildPlan, ImageRef, PipelineError, PipelineRunner};
use mockall::mock;

mock! {
    Executor {}

    impl DockerExecutor for Executor {
        async fn exec(&self, args: &[String]) -> Result<String, DockerError>;
        async fn exec_streaming(
            &self,
            args: &[String],
            secrets: &[Credential],
        ) -> Result<(), DockerError>;
        async fn exec_attached(
            &self,
            args: &[String],
            secrets: &[Credential],
        ) -> Result<i32, DockerError>;
    }
}

const TOKEN: &str = "123456789:AAH-secret_value";

fn failed(stderr: &str) -> DockerError {
    DockerError::CommandFailed {
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

fn inspect_json(env: &[&str], labels: &str, entrypoint: &str) -> String {
    let env = env
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"[{{
  "Id": "sha256:4f1c2d3e4a5b6c7d8e9f00112233445566778899aabbccddeeff001122334455",
  "RepoTags": ["echo-bot:latest"],
  "Created": "2026-10-16T09:00:00Z",
  "Size": 12500000,
  "Config": {{
    "Env": [{env}],
    "Entrypoint": {entrypoint},
    "Cmd": null,
    "WorkingDir": "/app",
    "Labels": {labels}
  }}
}}]"#
    )
}

fn good_inspect() -> String {
    inspect_json(
        &["PATH=/usr/bin", "APP_NAME=echo-bot"],
        r#"{"io.botdock.runtime-env": "TELOXIDE_TOKEN"}"#,
        r#"["/app/bot"]"#,
    )
}

type CallLog = Arc<Mutex<Vec<Vec<String>>>>;

/// A mock docker that records every `exec` call and answers by subcommand.
fn recording_exec(mock: &mut MockExecutor, log: &CallLog, inspect: String) {
    let log = Arc::clone(log);
    mock.expect_exec().returning(move |args| {
        log.lock().unwrap().push(args.to_vec());
        match (args[0].as_str(), args.get(1).map(String::as_str)) {
            ("image", Some("inspect")) if args.len() == 3 => Ok(inspect.clone()),
            ("image", Some("inspect")) => Ok("sha256:abc\n".to_owned()),
            ("image", Some("history")) => Ok("/bin/sh -c cargo build\nCOPY bot\n".to_owned()),
            _ => Ok(String::new()),
        }
    });
}

fn calls_to(log: &CallLog, subcommand: &str) -> Vec<Vec<String>> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|a| a[0] == subcommand)
        .cloned()
        .collect()
}

// ── Doctor Tests ──

#[tokio::test]
async fn doctor_reports_client_and_daemon() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.iter().any(|a| a.contains(".Client.")))
        .returning(|_| Ok("27.3.1\n".to_owned()));
    mock.expect_exec()
        .withf(|args| args.iter().any(|a| a.contains(".Server.")))
        .returning(|_| Ok("27.3.1\n".to_owned()));

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(report.docker.passed);
    assert_eq!(report.docker.detail, "27.3.1");
    assert!(report.daemon.passed);
    assert_eq!(report.daemon.detail, "Engine 27.3.1");
}

#[tokio::test]
async fn doctor_daemon_unreachable() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args.iter().any(|a| a.contains(".Client.")))
        .returning(|_| Ok("27.3.1\n".to_owned()));
    mock.expect_exec()
        .withf(|args| args.iter().any(|a| a.contains(".Server.")))
        .returning(|_| Err(failed("Cannot connect to the Docker daemon")));

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(report.docker.passed);
    assert!(!report.daemon.passed);
    assert!(!report.all_passed());
    assert!(report.to_string().contains("daemon not reachable"));
}

#[tokio::test]
async fn doctor_docker_missing() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_| {
        Err(DockerError::NotFound {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });

    let client = DockerClient::with_executor(mock);
    let report = client.doctor().await;

    assert!(!report.docker.passed);
    assert!(report.docker.detail.contains("docker CLI not found"));
}

// ── Build / Run Tests ──

#[tokio::test]
async fn build_passes_credential_by_name_only() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .withf(|args, secrets| {
            let joined = args.join(" ");
            joined.contains("--build-arg TELOXIDE_TOKEN")
                && joined.contains("--target builder")
                && !joined.contains(TOKEN)
                && secrets.len() == 1
                && secrets[0].expose() == TOKEN
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let client = DockerClient::with_executor(mock);
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);
    client
        .build(&BuildRequest {
            context: Path::new("/work/.botdock-bundle"),
            target: Some("builder"),
            tag: "echo-bot:botdock-builder",
            build_args: std::slice::from_ref(&credential),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn build_uses_bundle_dockerfile_and_context() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .withf(|args, secrets| {
            args.first().map(String::as_str) == Some("build")
                && args.windows(2).any(|w| w == ["--file", "/work/.botdock-bundle/Dockerfile"])
                && args.last().map(String::as_str) == Some("/work/.botdock-bundle")
                && !args.iter().any(|a| a == "--build-arg")
                && secrets.is_empty()
        })
        .returning(|_, _| Ok(()));

    let client = DockerClient::with_executor(mock);
    client
        .build(&BuildRequest {
            context: Path::new("/work/.botdock-bundle"),
            target: None,
            tag: "echo-bot:latest",
            build_args: &[],
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn run_returns_container_exit_code() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_attached()
        .withf(|args, secrets| {
            args == ["run", "--rm", "-e", "TELOXIDE_TOKEN", "echo-bot:latest"]
                && secrets.len() == 1
        })
        .returning(|_, _| Ok(3));

    let client = DockerClient::with_executor(mock);
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);
    let code = client
        .run(&RunRequest {
            image: "echo-bot:latest",
            env: std::slice::from_ref(&credential),
            env_file: None,
        })
        .await
        .unwrap();

    assert_eq!(code, 3);
}

#[tokio::test]
async fn run_with_env_file() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_attached()
        .withf(|args, secrets| {
            args == ["run", "--rm", "--env-file", "prod.env", "echo-bot:latest"] && secrets.is_empty()
        })
        .returning(|_, _| Ok(0));

    let client = DockerClient::with_executor(mock);
    let code = client
        .run(&RunRequest {
            image: "echo-bot:latest",
            env: &[],
            env_file: Some(Path::new("prod.env")),
        })
        .await
        .unwrap();

    assert_eq!(code, 0);
}

// ── Inspect Tests ──

#[tokio::test]
async fn inspect_parses_summary() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_| Ok(good_inspect()));

    let client = DockerClient::with_executor(mock);
    let summary = client.inspect("echo-bot:latest").await.unwrap();

    assert_eq!(summary.short_id(), "4f1c2d3e4a5b");
    assert_eq!(summary.repo_tags, ["echo-bot:latest"]);
    assert_eq!(summary.config.working_dir, "/app");
    assert_eq!(summary.config.entrypoint, ["/app/bot"]);
    assert!(summary.config.cmd.is_empty());
    assert_eq!(summary.declared_env(), ["TELOXIDE_TOKEN"]);
    assert!(summary.binds_env("APP_NAME"));
    assert!(!summary.binds_env("TELOXIDE_TOKEN"));
    assert!((summary.size_mb() - 12.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn inspect_rejects_garbage() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|_| Ok("not json".to_owned()));

    let client = DockerClient::with_executor(mock);
    let err = client.inspect("echo-bot:latest").await.unwrap_err();

    assert!(matches!(err, DockerError::UnexpectedOutput { .. }));
}

fn copy_mock(log: &CallLog, cp: fn() -> Result<String, DockerError>) -> MockExecutor {
    let mut mock = MockExecutor::new();
    let calls = Arc::clone(log);
    mock.expect_exec().returning(move |args| {
        calls.lock().unwrap().push(args.to_vec());
        match args[0].as_str() {
            "create" => Ok("c0ffee\n".to_owned()),
            "cp" => cp(),
            _ => Ok(String::new()),
        }
    });
    mock
}

#[tokio::test]
async fn copy_from_image_reports_missing_path() {
    let log: CallLog = Arc::default();
    let client = DockerClient::with_executor(copy_mock(&log, || {
        Err(failed("Error: No such container:path: c0ffee:/app/.env"))
    }));

    let copied = client
        .copy_from_image("echo-bot:latest", "/app/.env", Path::new("/tmp/x/.env"))
        .await
        .unwrap();

    assert!(!copied);
    assert_eq!(calls_to(&log, "cp")[0][1], "c0ffee:/app/.env");
    assert_eq!(calls_to(&log, "rm"), vec![vec!["rm".to_owned(), "c0ffee".to_owned()]]);
}

#[tokio::test]
async fn copy_from_image_removes_container_even_on_failure() {
    let log: CallLog = Arc::default();
    let client = DockerClient::with_executor(copy_mock(&log, || {
        Err(failed("Error response from daemon: i/o timeout"))
    }));

    let result = client
        .copy_from_image("echo-bot:latest", "/app/.env", Path::new("/tmp/x/.env"))
        .await;

    assert!(matches!(result, Err(DockerError::CommandFailed { .. })));
    assert_eq!(calls_to(&log, "rm"), vec![vec!["rm".to_owned(), "c0ffee".to_owned()]]);
}

// ── Pipeline Runner Tests ──

fn plan<'a>(
    image: &'a ImageRef,
    delivery: SecretDelivery,
    credential: Option<&'a Credential>,
) -> BuildPlan<'a> {
    BuildPlan {
        context: Path::new("/work/.botdock-bundle"),
        image,
        delivery,
        env_var: "TELOXIDE_TOKEN",
        credential,
    }
}

#[tokio::test]
async fn runtime_env_pipeline_packages_and_promotes() {
    let log: CallLog = Arc::default();
    let builds: CallLog = Arc::default();
    let mut mock = MockExecutor::new();
    recording_exec(&mut mock, &log, good_inspect());
    let b = Arc::clone(&builds);
    mock.expect_exec_streaming().returning(move |args, secrets| {
        assert!(secrets.is_empty(), "runtime_env must not pass the credential to docker build");
        b.lock().unwrap().push(args.to_vec());
        Ok(())
    });

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "latest");
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);
    let report = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::RuntimeEnv, Some(&credential)))
        .await
        .unwrap();

    assert_eq!(report.image, "echo-bot:latest");
    assert!(report.run.succeeded());
    assert_eq!(
        report.run.history(),
        &[
            PipelineState::BuildPending,
            PipelineState::Building,
            PipelineState::BuildSucceeded,
            PipelineState::Packaging,
            PipelineState::Packaged,
        ]
    );

    let builds = builds.lock().unwrap();
    assert_eq!(builds.len(), 2);
    assert!(builds[0].join(" ").contains("--tag echo-bot:botdock-builder --target builder"));
    assert!(builds[1].join(" ").contains("--tag echo-bot:botdock-staging"));
    assert!(!builds[1].contains(&"--target".to_owned()));

    assert_eq!(
        calls_to(&log, "tag"),
        vec![vec![
            "tag".to_owned(),
            "echo-bot:botdock-staging".to_owned(),
            "echo-bot:latest".to_owned()
        ]]
    );
    let removed: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|a| a[0] == "image" && a[1] == "rm")
        .map(|a| a[2].clone())
        .collect();
    assert_eq!(removed, ["echo-bot:botdock-staging", "echo-bot:botdock-builder"]);
}

#[tokio::test]
async fn reserved_tags_are_rejected_before_any_docker_call() {
    // No expectations: any docker invocation panics the mock.
    let client = DockerClient::with_executor(MockExecutor::new());

    for tag in ["botdock-staging", "botdock-builder"] {
        let image = ImageRef::new("echo-bot", tag);
        let err = PipelineRunner::new(&client)
            .run(&plan(&image, SecretDelivery::RuntimeEnv, None))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidImage { .. }), "{tag}: {err:?}");
        assert_eq!(err.state(), PipelineState::BuildPending);
        assert!(err.to_string().contains("reserved"));
    }
}

#[tokio::test]
async fn invalid_repository_is_not_reported_as_build_failure() {
    let client = DockerClient::with_executor(MockExecutor::new());
    let image = ImageRef::new("Echo-Bot", "latest");

    let err = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::RuntimeEnv, None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidImage { .. }));
    assert_ne!(err.state(), PipelineState::BuildFailed);
    assert!(err.to_string().contains("Echo-Bot:latest"));
}

#[test]
fn image_ref_validation() {
    for (repo, tag) in [
        ("echo-bot", "latest"),
        ("echo_bot", "v1.2.3"),
        ("org/echo-bot", "2024-10-16"),
        ("ghcr.io/org/echo-bot", "sha_abc"),
        ("localhost:5000/echo-bot", "dev"),
    ] {
        assert!(ImageRef::new(repo, tag).validate().is_ok(), "{repo}:{tag}");
    }

    for (repo, tag) in [
        ("", "latest"),
        ("Echo", "latest"),
        ("echo bot", "latest"),
        ("-echo", "latest"),
        ("echo-", "latest"),
        ("org//echo", "latest"),
        ("localhost:/echo", "latest"),
        ("echo", ""),
        ("echo", ".hidden"),
        ("echo", "-x"),
        ("echo", "a:b"),
        ("echo", "botdock-staging"),
    ] {
        assert!(ImageRef::new(repo, tag).validate().is_err(), "{repo}:{tag}");
    }
    assert!(ImageRef::new("echo", "x".repeat(129)).validate().is_err());
}

#[tokio::test]
async fn build_time_file_pipeline_passes_credential() {
    let log: CallLog = Arc::default();
    let mut mock = MockExecutor::new();
    recording_exec(&mut mock, &log, good_inspect());
    mock.expect_exec_streaming()
        .withf(|args, secrets| {
            args.contains(&"--build-arg".to_owned())
                && !args.iter().any(|a| a.contains(TOKEN))
                && secrets.len() == 1
                && secrets[0].name() == "TELOXIDE_TOKEN"
        })
        .times(2)
        .returning(|_, _| Ok(()));

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "v1");
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);
    let report = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::BuildTimeFile, Some(&credential)))
        .await
        .unwrap();

    assert_eq!(report.image, "echo-bot:v1");
    assert!(report.run.succeeded());
}

#[tokio::test]
async fn failing_compile_ends_in_build_failed_without_image() {
    let log: CallLog = Arc::default();
    let mut mock = MockExecutor::new();
    recording_exec(&mut mock, &log, good_inspect());
    mock.expect_exec_streaming()
        .times(1)
        .returning(|_, _| Err(failed("error[E0425]: cannot find value `x` in this scope")));

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "latest");
    let err = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::RuntimeEnv, None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::BuildFailed { .. }));
    assert_eq!(err.state(), PipelineState::BuildFailed);
    assert!(calls_to(&log, "tag").is_empty());
}

#[tokio::test]
async fn packaging_failure_never_tags_requested_image() {
    let log: CallLog = Arc::default();
    let mut mock = MockExecutor::new();
    recording_exec(&mut mock, &log, good_inspect());
    mock.expect_exec_streaming().returning(|args, _| {
        if args.contains(&"--target".to_owned()) {
            Ok(())
        } else {
            Err(failed("COPY failed: stat app/target/release/echo-bot: file does not exist"))
        }
    });

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "latest");
    let err = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::RuntimeEnv, None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::PackagingFailed { .. }));
    assert_eq!(err.state(), PipelineState::Packaging);
    assert!(calls_to(&log, "tag").is_empty());
    // the builder tag is still cleaned up
    assert!(
        log.lock()
            .unwrap()
            .iter()
            .any(|a| a[..2] == ["image", "rm"] && a[2] == "echo-bot:botdock-builder")
    );
}

#[tokio::test]
async fn build_time_file_requires_credential() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming().never();
    mock.expect_exec().never();

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "latest");
    let err = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::BuildTimeFile, None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingCredential { ref name } if name == "TELOXIDE_TOKEN"));
    assert_eq!(err.state(), PipelineState::BuildPending);
}

#[tokio::test]
async fn build_time_file_rejects_unsafe_value() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming().never();
    mock.expect_exec().never();

    let client = DockerClient::with_executor(mock);
    let image = ImageRef::new("echo-bot", "latest");
    let credential = Credential::new("TELOXIDE_TOKEN", "has space");
    let err = PipelineRunner::new(&client)
        .run(&plan(&image, SecretDelivery::BuildTimeFile, Some(&credential)))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Credential { .. }));
}

// ── Audit Tests ──

fn expectation<'a>(
    paths: &'a StagePaths,
    delivery: SecretDelivery,
    credential: Option<&'a Credential>,
) -> AuditExpectation<'a> {
    AuditExpectation {
        env_var: "TELOXIDE_TOKEN",
        delivery,
        paths,
        credential,
    }
}

/// Mock docker whose `cp` either writes `dotenv` to the destination or fails.
fn audit_mock(inspect: String, history: &'static str, dotenv: Option<&'static str>) -> MockExecutor {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(move |args| match args[0].as_str() {
        "image" if args[1] == "inspect" => Ok(inspect.clone()),
        "image" if args[1] == "history" => Ok(history.to_owned()),
        "create" => Ok("c0ffee\n".to_owned()),
        "cp" => match dotenv {
            Some(content) => {
                std::fs::write(PathBuf::from(&args[2]), content).unwrap();
                Ok(String::new())
            }
            None => Err(failed("Could not find the file")),
        },
        _ => Ok(String::new()),
    });
    mock
}

#[tokio::test]
async fn audit_runtime_env_image_passes() {
    let client = DockerClient::with_executor(audit_mock(good_inspect(), "COPY bot\n", None));
    let paths = StagePaths::default();
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, Some(&credential)),
    )
    .await
    .unwrap();

    assert!(report.passed(), "{report}");
    assert!(!report.to_string().contains(TOKEN));
}

#[tokio::test]
async fn audit_flags_bound_credential() {
    let inspect = inspect_json(
        &["TELOXIDE_TOKEN=leaked"],
        r#"{"io.botdock.runtime-env": "TELOXIDE_TOKEN"}"#,
        r#"["/app/bot"]"#,
    );
    let client = DockerClient::with_executor(audit_mock(inspect, "", None));
    let paths = StagePaths::default();

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, None),
    )
    .await
    .unwrap();

    assert!(!report.unbound.passed);
    assert!(!report.passed());
}

#[tokio::test]
async fn audit_flags_missing_label_and_shell_entrypoint() {
    let inspect = inspect_json(&[], "null", r#"["/bin/sh", "-c", "/app/bot"]"#);
    let client = DockerClient::with_executor(audit_mock(inspect, "", None));
    let paths = StagePaths::default();

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, None),
    )
    .await
    .unwrap();

    assert!(!report.declared.passed);
    assert!(!report.entrypoint.passed);
}

#[tokio::test]
async fn audit_flags_value_in_history() {
    let history: &'static str = "RUN /bin/sh -c echo 123456789:AAH-secret_value\n";
    let client = DockerClient::with_executor(audit_mock(good_inspect(), history, None));
    let paths = StagePaths::default();
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, Some(&credential)),
    )
    .await
    .unwrap();

    assert!(!report.history.passed);
    assert_eq!(report.history.detail, "value appears in 1 layer(s)");
}

#[tokio::test]
async fn audit_runtime_env_fails_when_container_cannot_be_created() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(|args| match args[0].as_str() {
        "image" if args[1] == "inspect" => Ok(good_inspect()),
        "image" if args[1] == "history" => Ok("COPY bot\n".to_owned()),
        "create" => Err(failed("Cannot connect to the Docker daemon")),
        _ => Ok(String::new()),
    });
    let client = DockerClient::with_executor(mock);
    let paths = StagePaths::default();

    let err = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, None),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AuditError::CopyOut { .. }));
}

#[tokio::test]
async fn audit_runtime_env_rejects_shipped_dotenv() {
    let client = DockerClient::with_executor(audit_mock(
        good_inspect(),
        "",
        Some("TELOXIDE_TOKEN=x\n"),
    ));
    let paths = StagePaths::default();

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::RuntimeEnv, None),
    )
    .await
    .unwrap();

    assert!(!report.dotenv.passed);
}

#[tokio::test]
async fn audit_build_time_file_matches_byte_for_byte() {
    let client = DockerClient::with_executor(audit_mock(
        good_inspect(),
        "",
        Some("TELOXIDE_TOKEN=123456789:AAH-secret_value\n"),
    ));
    let paths = StagePaths::default();
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::BuildTimeFile, Some(&credential)),
    )
    .await
    .unwrap();

    assert!(report.dotenv.passed, "{report}");
    assert!(report.passed());
}

#[tokio::test]
async fn audit_build_time_file_detects_mismatch() {
    let client = DockerClient::with_executor(audit_mock(
        good_inspect(),
        "",
        Some("TELOXIDE_TOKEN=123456789:AAH-secret_valu\n"),
    ));
    let paths = StagePaths::default();
    let credential = Credential::new("TELOXIDE_TOKEN", TOKEN);

    let report = audit_image(
        &client,
        "echo-bot:latest",
        &expectation(&paths, SecretDelivery::BuildTimeFile, Some(&credential)),
    )
    .await
    .unwrap();

    assert!(!report.dotenv.passed);
    assert!(!report.dotenv.detail.contains(TOKEN));
}
