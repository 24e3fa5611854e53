use super::*;
use crate::model::{
    EnvValue, ExecMode, HumanDuration, Instances, MemorySize, WatchSetting,
};
use std::path::PathBuf;

const RATECARD: &str = r#"
app "ratecard-app" {
    script "./dist/index.js"
    instances "max"
    exec_mode "cluster"
    env {
        NODE_ENV "production"
        PORT 5000
    }
    env_production {
        NODE_ENV "production"
        PORT 5000
    }
    error_file "./logs/err.log"
    out_file "./logs/out.log"
    log_file "./logs/combined.log"
    time #true
    max_memory_restart "1G"
    watch #false
    ignore_watch "node_modules" "logs" "uploads" ".git" "dist"
    restart_delay 4000
    max_restarts 10
    min_uptime "60s"
    autorestart #true
    kill_timeout 5000
    listen_timeout 8000
    log_date_format "YYYY-MM-DD HH:mm Z"
    merge_logs #true
    pmx #true
    health_check_grace_period 10000
}

deploy "production" {
    user "ubuntu"
    host "your-server-ip"
    ref "origin/main"
    repo "https://github.com/yourusername/your-repo.git"
    path "/home/ubuntu/ratecard"
    post-deploy "npm install && npm run build"
    pre-setup "apt update && apt install git -y"
}
"#;

#[test]
fn test_parse_flat_app() {
    let ecosystem = parse_kdl_string(RATECARD).unwrap();
    assert_eq!(ecosystem.apps.len(), 1);

    let app = &ecosystem.apps[0];
    assert_eq!(app.name, "ratecard-app");
    assert_eq!(app.script, PathBuf::from("./dist/index.js"));
    assert_eq!(app.instances, Some(Instances::Max));
    assert_eq!(app.exec_mode, Some(ExecMode::Cluster));

    assert_eq!(app.env["NODE_ENV"], EnvValue::from("production"));
    assert_eq!(app.env["PORT"], EnvValue::Integer(5000));
    assert_eq!(app.env_profiles["production"]["PORT"], EnvValue::Integer(5000));

    assert_eq!(app.logs.error_file, Some(PathBuf::from("./logs/err.log")));
    assert_eq!(app.logs.time, Some(true));
    assert_eq!(app.logs.merge_logs, Some(true));
    assert_eq!(
        app.logs.log_date_format.as_deref(),
        Some("YYYY-MM-DD HH:mm Z")
    );

    assert_eq!(app.watch.watch, Some(WatchSetting::Enabled(false)));
    assert_eq!(app.watch.ignore_watch.len(), 5);

    assert_eq!(app.restart.autorestart, Some(true));
    assert_eq!(app.restart.max_restarts, Some(10));
    assert_eq!(app.restart.restart_delay, Some(4000));
    assert_eq!(app.restart.kill_timeout, Some(5000));
    assert_eq!(app.restart.listen_timeout, Some(8000));
    assert_eq!(
        app.restart.min_uptime,
        Some(HumanDuration::from_millis(60_000))
    );
    assert_eq!(
        app.restart.max_memory_restart,
        Some(MemorySize::from_bytes(1 << 30))
    );

    assert_eq!(app.monitoring.pmx, Some(true));
    assert_eq!(app.monitoring.health_check_grace_period, Some(10000));
    assert!(app.extra.is_empty());
}

#[test]
fn test_parse_deploy() {
    let ecosystem = parse_kdl_string(RATECARD).unwrap();
    let target = &ecosystem.deploy["production"];

    assert_eq!(target.user.as_deref(), Some("ubuntu"));
    assert_eq!(target.host, vec!["your-server-ip"]);
    assert_eq!(target.git_ref.as_deref(), Some("origin/main"));
    assert_eq!(target.path, Some(PathBuf::from("/home/ubuntu/ratecard")));
    assert_eq!(
        target.post_deploy.as_deref(),
        Some("npm install && npm run build")
    );
    assert_eq!(
        target.pre_setup.as_deref(),
        Some("apt update && apt install git -y")
    );
}

#[test]
fn test_grouped_keys_match_flat_keys() {
    let grouped = r#"
        app "ratecard-app" {
            script "./dist/index.js"
            instances "max"
            exec_mode "cluster"
            env {
                NODE_ENV "production"
                PORT 5000
            }
            env "production" {
                NODE_ENV "production"
                PORT 5000
            }
            restart {
                autorestart #true
                max_restarts 10
                min_uptime "1m"
                restart_delay 4000
                kill_timeout "5s"
                listen_timeout 8000
                max_memory_restart "1024M"
            }
            logs {
                error_file "./logs/err.log"
                out_file "./logs/out.log"
                log_file "./logs/combined.log"
                time #true
                log_date_format "YYYY-MM-DD HH:mm Z"
                merge_logs #true
            }
            watch #false {
                ignore "node_modules" "logs" "uploads" ".git" "dist"
            }
            monitoring {
                pmx #true
                health_check_grace_period "10s"
            }
        }
    "#;

    let flat = parse_kdl_string(RATECARD).unwrap();
    let grouped = parse_kdl_string(grouped).unwrap();
    assert_eq!(grouped.apps, flat.apps);
}

#[test]
fn test_parse_minimal_app() {
    let kdl = r#"
        app "worker" {
            script "./worker.js"
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let app = &ecosystem.apps[0];
    assert_eq!(app.instances, None);
    assert_eq!(app.effective_exec_mode(), ExecMode::Fork);
    assert!(app.restart.is_empty());
    assert!(ecosystem.deploy.is_empty());
}

#[test]
fn test_apps_keep_declaration_order() {
    let kdl = r#"
        app "web" { script "./web.js"; }
        app "api" { script "./api.js"; }
        app "worker" { script "./worker.js"; }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let names: Vec<&str> = ecosystem.apps.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["web", "api", "worker"]);
}

#[test]
fn test_watch_paths() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            watch "src" "config"
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    assert_eq!(
        ecosystem.apps[0].watch.watch,
        Some(WatchSetting::Paths(vec![
            "src".to_string(),
            "config".to_string()
        ]))
    );
}

#[test]
fn test_flat_env_pairs() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            env "NODE_ENV=production" "PORT=5000"
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let app = &ecosystem.apps[0];
    assert!(app.env_profiles.is_empty());
    assert_eq!(app.env["PORT"], EnvValue::from("5000"));
}

/// `=` のない env 引数はエラー（ブレースを忘れたプロファイル指定など）
#[test]
fn test_flat_env_without_equals_is_error() {
    for env in [r#"env "production""#, r#"env "NODE_ENV=production" "NODE_ENV""#] {
        let kdl = format!(
            r#"
            app "api" {{
                script "./api.js"
                {}
            }}
            "#,
            env
        );
        match parse_kdl_string(&kdl) {
            Err(FlowError::InvalidField { owner, field, .. }) => {
                assert_eq!(owner, "app \"api\"");
                assert_eq!(field, "env");
            }
            other => panic!("{} は拒否されるべき: {:?}", env, other),
        }
    }
}

/// `(list)` 注釈付きのノードは引数の数によらず配列
#[test]
fn test_list_annotation_keeps_arrays() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            (list)args "--verbose"
            (list)node_args
            (list)watch
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let app = &ecosystem.apps[0];
    assert_eq!(app.extra["args"], serde_json::json!(["--verbose"]));
    assert_eq!(app.extra["node_args"], serde_json::json!([]));
    assert_eq!(app.watch.watch, Some(WatchSetting::Paths(vec![])));
    assert!(!app.watch.is_enabled());
}

#[test]
fn test_unknown_keys_are_kept() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            cron_restart "0 3 * * *"
            node_args "--inspect" "--max-old-space-size=512"
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let app = &ecosystem.apps[0];
    assert_eq!(app.extra["cron_restart"], serde_json::json!("0 3 * * *"));
    assert_eq!(
        app.extra["node_args"],
        serde_json::json!(["--inspect", "--max-old-space-size=512"])
    );
}

#[test]
fn test_unknown_top_level_nodes_are_skipped() {
    let kdl = r#"
        project "ratecard"
        app "api" { script "./api.js"; }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    assert_eq!(ecosystem.apps.len(), 1);
}

#[test]
fn test_missing_script_is_error() {
    let kdl = r#"
        app "api" {
            instances 2
        }
    "#;

    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidField { ref field, .. } if field == "script"
    ));
}

#[test]
fn test_app_without_name_is_error() {
    let kdl = r#"
        app {
            script "./api.js"
        }
    "#;

    assert!(matches!(
        parse_kdl_string(kdl),
        Err(FlowError::InvalidConfig(_))
    ));
}

#[test]
fn test_duplicate_app_is_error() {
    let kdl = r#"
        app "api" { script "./a.js"; }
        app "api" { script "./b.js"; }
    "#;

    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(err.to_string().contains("重複"));
}

#[test]
fn test_negative_values_are_rejected() {
    for key in ["max_restarts -1", "restart_delay -100", "min_uptime \"-5s\""] {
        let kdl = format!(
            r#"
            app "api" {{
                script "./api.js"
                {}
            }}
            "#,
            key
        );
        assert!(
            matches!(parse_kdl_string(&kdl), Err(FlowError::InvalidField { .. })),
            "{} は拒否されるべき",
            key
        );
    }
}

#[test]
fn test_unknown_exec_mode_is_error() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            exec_mode "thread"
        }
    "#;

    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(err.to_string().contains("exec_mode"));
    assert!(err.to_string().contains("app \"api\""));
}

#[test]
fn test_invalid_memory_size() {
    let kdl = r#"
        app "api" {
            script "./api.js"
            max_memory_restart "lots"
        }
    "#;

    assert!(parse_kdl_string(kdl).is_err());
}

#[test]
fn test_deploy_multiple_hosts_and_ssh() {
    let kdl = r#"
        deploy "staging" {
            user "deploy"
            host "10.0.0.1" "10.0.0.2"
            host "10.0.0.3"
            path "/srv/app"
            port 2222
            key "~/.ssh/deploy"
            ssh_options "StrictHostKeyChecking=no"
            env {
                NODE_ENV "staging"
            }
        }
    "#;

    let ecosystem = parse_kdl_string(kdl).unwrap();
    let target = &ecosystem.deploy["staging"];
    assert_eq!(target.host.len(), 3);
    assert_eq!(target.port, Some(2222));
    assert_eq!(target.key, Some(PathBuf::from("~/.ssh/deploy")));
    assert_eq!(target.ssh_options, vec!["StrictHostKeyChecking=no"]);
    assert_eq!(target.env["NODE_ENV"], EnvValue::from("staging"));
}

#[test]
fn test_deploy_unknown_key_is_error() {
    let kdl = r#"
        deploy "production" {
            host "10.0.0.1"
            branch "main"
        }
    "#;

    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(err.to_string().contains("branch"));
}

#[test]
fn test_deploy_port_out_of_range() {
    let kdl = r#"
        deploy "production" {
            host "10.0.0.1"
            port 70000
        }
    "#;

    assert!(parse_kdl_string(kdl).is_err());
}

#[test]
fn test_invalid_kdl_syntax() {
    let kdl = r#"app "api" { script "./api.js""#;
    assert!(matches!(
        parse_kdl_string(kdl),
        Err(FlowError::KdlParse(_))
    ));
}

#[test]
fn test_parse_kdl_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("ecosystem.kdl");
    std::fs::write(&path, RATECARD).unwrap();

    let ecosystem = parse_kdl_file(&path).unwrap();
    assert_eq!(ecosystem.apps[0].name, "ratecard-app");
}
