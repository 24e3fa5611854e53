//! デプロイ先定義

use super::env::EnvMap;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// デプロイ先（環境ごと）
///
/// KDL形式：
/// ```kdl
/// deploy "production" {
///     user "ubuntu"
///     host "10.0.0.1" "10.0.0.2"
///     ref "origin/main"
///     repo "https://github.com/owner/repo.git"
///     path "/home/ubuntu/app"
///     post-deploy "npm install && npm run build"
///     pre-setup "apt update && apt install git -y"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployTarget {
    /// SSHユーザー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// 接続先ホスト（宣言順にデプロイする）
    #[serde(default, deserialize_with = "one_or_many")]
    pub host: Vec<String>,
    /// チェックアウトするgit ref（例: origin/main）
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// リモートリポジトリURL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// リモート側の配置パス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// コード取得後にリモートで実行するコマンド
    #[serde(
        rename = "post-deploy",
        alias = "post_deploy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub post_deploy: Option<String>,
    /// 初回セットアップ前にリモートで実行するコマンド
    #[serde(
        rename = "pre-setup",
        alias = "pre_setup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_setup: Option<String>,
    /// 初回セットアップ後にリモートで実行するコマンド
    #[serde(
        rename = "post-setup",
        alias = "post_setup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub post_setup: Option<String>,
    /// デプロイ前にローカルで実行するコマンド
    #[serde(
        rename = "pre-deploy-local",
        alias = "pre_deploy_local",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_deploy_local: Option<String>,
    /// コード取得前にリモートで実行するコマンド
    #[serde(
        rename = "pre-deploy",
        alias = "pre_deploy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_deploy: Option<String>,
    /// SSH秘密鍵のパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,
    /// SSHポート
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// 追加のSSHオプション（`StrictHostKeyChecking=no` など）
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ssh_options: Vec<String>,
    /// post-deploy 実行時にエクスポートする環境変数
    #[serde(default, skip_serializing_if = "EnvMap::is_empty")]
    pub env: EnvMap,
}

impl DeployTarget {
    /// `user@host` 形式の接続先
    pub fn destination(&self, host: &str) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, host),
            None => host.to_string(),
        }
    }
}

/// 文字列1つ、または文字列の配列を受け付ける
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OneOrMany;

    impl<'de> Visitor<'de> for OneOrMany {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element::<String>()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(OneOrMany)
}
