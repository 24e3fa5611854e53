//! deploy ノードのパース

use super::values::Scope;
use crate::error::{FlowError, Result};
use crate::model::DeployTarget;
use kdl::KdlNode;
use std::path::PathBuf;

/// deploy ノードをパース
pub fn parse_deploy(node: &KdlNode) -> Result<(String, DeployTarget)> {
    let name = node
        .entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| FlowError::InvalidConfig("deploy requires an environment name".to_string()))?
        .to_string();

    let scope = Scope::new("deploy", &name);
    let mut target = DeployTarget::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "user" => {
                    target.user = Some(scope.string(child)?);
                }
                // host "a" "b" でも、host を複数行書いてもよい
                "host" | "hosts" => {
                    target.host.extend(scope.strings(child)?);
                }
                "ref" => {
                    target.git_ref = Some(scope.string(child)?);
                }
                "repo" => {
                    target.repo = Some(scope.string(child)?);
                }
                "path" => {
                    target.path = Some(PathBuf::from(scope.string(child)?));
                }
                "post-deploy" | "post_deploy" => {
                    target.post_deploy = Some(scope.string(child)?);
                }
                "pre-setup" | "pre_setup" => {
                    target.pre_setup = Some(scope.string(child)?);
                }
                "post-setup" | "post_setup" => {
                    target.post_setup = Some(scope.string(child)?);
                }
                "pre-deploy-local" | "pre_deploy_local" => {
                    target.pre_deploy_local = Some(scope.string(child)?);
                }
                "pre-deploy" | "pre_deploy" => {
                    target.pre_deploy = Some(scope.string(child)?);
                }
                "key" => {
                    target.key = Some(PathBuf::from(scope.string(child)?));
                }
                "port" => {
                    let port = u16::try_from(scope.unsigned(child)?)
                        .map_err(|_| scope.error(child, "1〜65535 のポート番号を指定してください"))?;
                    target.port = Some(port);
                }
                "ssh_options" => {
                    target.ssh_options.extend(scope.strings(child)?);
                }
                "env" => {
                    target.env.extend(scope.env_map(child)?);
                }
                other => {
                    return Err(scope.error(child, format!("不明なキーです: {}", other)));
                }
            }
        }
    }

    Ok((name, target))
}
