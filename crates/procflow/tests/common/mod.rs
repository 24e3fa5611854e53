use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// ratecard アプリの ecosystem（KDL）
#[allow(dead_code)]
pub const RATECARD_KDL: &str = r#"
app "ratecard-app" {
    script "./dist/index.js"
    instances "max"
    exec_mode "cluster"
    env {
        NODE_ENV "production"
        PORT 5000
    }
    env "staging" {
        NODE_ENV "staging"
        PORT 5001
    }
    restart {
        autorestart #true
        max_restarts 10
        min_uptime "60s"
        restart_delay 4000
        kill_timeout 5000
        listen_timeout 8000
        max_memory_restart "1G"
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
        health_check_grace_period 10000
    }
}

deploy "production" {
    user "ubuntu"
    host "10.0.0.1" "10.0.0.2"
    ref "origin/main"
    repo "https://github.com/acme/ratecard.git"
    path "/home/ubuntu/ratecard"
    post-deploy "npm install && npm run build"
    pre-setup "apt update && apt install git -y"
}
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// ecosystem.kdl を書き込む
    #[allow(dead_code)]
    pub fn write_ecosystem_kdl(&self, content: &str) -> PathBuf {
        self.write("ecosystem.kdl", content)
    }

    #[allow(dead_code)]
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}
