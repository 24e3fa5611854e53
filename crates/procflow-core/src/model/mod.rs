//! モデル定義
//!
//! 設定ファイルのデータモデルを定義します。
//! 各モデルは機能ごとにモジュールに分離されています。

mod app;
mod deploy;
mod ecosystem;
mod env;
mod logs;
mod restart;
mod units;
mod watch;

// Re-exports
pub use app::*;
pub use deploy::*;
pub use ecosystem::*;
pub use env::*;
pub use logs::*;
pub use restart::*;
pub use units::*;
pub use watch::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_lookup() {
        let mut ecosystem = Ecosystem::default();
        ecosystem.apps.push(App::new("api", "./dist/index.js"));
        ecosystem
            .deploy
            .insert("production".to_string(), DeployTarget::default());

        assert_eq!(ecosystem.app("api").unwrap().name, "api");
        assert!(ecosystem.app("worker").is_err());
        assert!(ecosystem.deploy_target("production").is_ok());
        assert!(ecosystem.deploy_target("staging").is_err());
    }

    #[test]
    fn test_env_profiles_are_deduplicated() {
        let mut api = App::new("api", "./api.js");
        api.env_profiles
            .insert("production".to_string(), EnvMap::new());
        let mut worker = App::new("worker", "./worker.js");
        worker
            .env_profiles
            .insert("production".to_string(), EnvMap::new());
        worker.env_profiles.insert("staging".to_string(), EnvMap::new());

        let ecosystem = Ecosystem {
            apps: vec![api, worker],
            deploy: Default::default(),
        };
        assert_eq!(ecosystem.env_profiles(), vec!["production", "staging"]);
    }

    #[test]
    fn test_ecosystem_json_serialization() {
        let json = r#"{
            "apps": [{
                "name": "ratecard-app",
                "script": "./dist/index.js",
                "instances": "max",
                "exec_mode": "cluster",
                "env": {"NODE_ENV": "production", "PORT": 5000},
                "max_memory_restart": "1G",
                "min_uptime": "60s"
            }],
            "deploy": {
                "production": {
                    "user": "ubuntu",
                    "host": ["10.0.0.1"],
                    "ref": "origin/main"
                }
            }
        }"#;

        let ecosystem: Ecosystem = serde_json::from_str(json).unwrap();
        let app = &ecosystem.apps[0];
        assert_eq!(app.instances, Some(Instances::Max));
        assert_eq!(app.exec_mode, Some(ExecMode::Cluster));
        assert_eq!(app.env["PORT"], EnvValue::Integer(5000));
        assert_eq!(
            app.restart.max_memory_restart,
            Some(MemorySize::from_bytes(1 << 30))
        );
        assert_eq!(
            app.restart.min_uptime,
            Some(HumanDuration::from_millis(60_000))
        );
        assert_eq!(ecosystem.deploy["production"].host, vec!["10.0.0.1"]);
    }
}
