//! ノード値の取り出し
//!
//! 値の型が合わない場合は、どの app/deploy のどのキーかを含めたエラーにする。

use crate::emitter::LIST_TYPE;
use crate::error::{FlowError, Result};
use crate::model::{EnvMap, EnvValue, HumanDuration};
use kdl::{KdlNode, KdlValue};

/// エラーメッセージ用の位置情報（`app "api"` や `deploy "production"`）
#[derive(Debug, Clone)]
pub struct Scope {
    owner: String,
}

impl Scope {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            owner: format!("{} \"{}\"", kind, name),
        }
    }

    pub fn error(&self, node: &KdlNode, message: impl Into<String>) -> FlowError {
        FlowError::InvalidField {
            owner: self.owner.clone(),
            field: node.name().value().to_string(),
            message: message.into(),
        }
    }

    /// 最初の引数
    pub fn value<'n>(&self, node: &'n KdlNode) -> Result<&'n KdlValue> {
        node.entries()
            .iter()
            .find(|e| e.name().is_none())
            .map(|e| e.value())
            .ok_or_else(|| self.error(node, "値が指定されていません"))
    }

    pub fn string(&self, node: &KdlNode) -> Result<String> {
        self.value(node)?
            .as_string()
            .map(|s| s.to_string())
            .ok_or_else(|| self.error(node, "文字列を指定してください"))
    }

    pub fn bool(&self, node: &KdlNode) -> Result<bool> {
        let value = self.value(node)?;
        if let Some(b) = value.as_bool() {
            return Ok(b);
        }
        // 文字列 "true"/"false" も受け付ける
        match value.as_string() {
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            _ => Err(self.error(node, "#true または #false を指定してください")),
        }
    }

    /// 0以上の整数
    pub fn unsigned(&self, node: &KdlNode) -> Result<u64> {
        let value = self.value(node)?;
        value
            .as_integer()
            .and_then(|i| u64::try_from(i).ok())
            .ok_or_else(|| self.error(node, "0以上の整数を指定してください"))
    }

    /// ミリ秒（整数、または `5s` のような文字列）
    pub fn millis(&self, node: &KdlNode) -> Result<u64> {
        self.duration(node).map(|d| d.as_millis())
    }

    pub fn duration(&self, node: &KdlNode) -> Result<HumanDuration> {
        let value = self.value(node)?;
        if let Some(s) = value.as_string() {
            return HumanDuration::parse(s).map_err(|e| self.error(node, e.to_string()));
        }
        self.unsigned(node).map(HumanDuration::from_millis)
    }

    /// 全ての引数を文字列として取得
    pub fn strings(&self, node: &KdlNode) -> Result<Vec<String>> {
        node.entries()
            .iter()
            .filter(|e| e.name().is_none())
            .map(|e| {
                e.value()
                    .as_string()
                    .map(|s| s.to_string())
                    .ok_or_else(|| self.error(node, "文字列を指定してください"))
            })
            .collect()
    }

    /// 子ノードを `KEY value` の環境変数マップとして取得
    pub fn env_map(&self, node: &KdlNode) -> Result<EnvMap> {
        let mut env = EnvMap::new();
        if let Some(children) = node.children() {
            for var in children.nodes() {
                let key = var.name().value().to_string();
                let value = EnvValue::from_kdl(self.value(var)?)
                    .ok_or_else(|| self.error(var, "null は指定できません"))?;
                env.insert(key, value);
            }
        } else {
            // 子ノードがない場合は、フラットな env "KEY=VALUE" 形式をサポート
            for pair in self.strings(node)? {
                let (k, v) = pair.split_once('=').ok_or_else(|| {
                    self.error(
                        node,
                        format!("'{}' は KEY=VALUE 形式で指定してください", pair),
                    )
                })?;
                env.insert(k.trim().to_string(), EnvValue::from(v.trim()));
            }
        }
        Ok(env)
    }
}

/// `(list)` 型注釈付きのノードか
pub fn is_list(node: &KdlNode) -> bool {
    node.ty().is_some_and(|ty| ty.value() == LIST_TYPE)
}

/// KDLの値をJSONの値に変換（未知のキーの保持用）
pub fn kdl_to_json(value: &KdlValue) -> serde_json::Value {
    match value {
        KdlValue::String(s) => serde_json::Value::String(s.clone()),
        KdlValue::Integer(i) => i64::try_from(*i)
            .map(serde_json::Value::from)
            .unwrap_or_else(|_| serde_json::Value::String(i.to_string())),
        KdlValue::Float(f) => serde_json::Value::from(*f),
        KdlValue::Bool(b) => serde_json::Value::Bool(*b),
        KdlValue::Null => serde_json::Value::Null,
    }
}

/// 未知のノードをJSONの値として保持
///
/// `(list)` 注釈があれば配列（子ノードがあれば各子の値、なければ全引数）。
/// それ以外は、子ノードがあればオブジェクト、引数1つならその値、複数なら配列にする。
/// 引数なしのノードは `true` として扱う。
pub fn node_to_json(node: &KdlNode) -> serde_json::Value {
    if is_list(node) {
        return match node.children() {
            Some(children) => {
                serde_json::Value::Array(children.nodes().iter().map(node_to_json).collect())
            }
            None => serde_json::Value::Array(
                node.entries()
                    .iter()
                    .filter(|e| e.name().is_none())
                    .map(|e| kdl_to_json(e.value()))
                    .collect(),
            ),
        };
    }

    if let Some(children) = node.children() {
        return serde_json::Value::Object(
            children
                .nodes()
                .iter()
                .map(|child| (child.name().value().to_string(), node_to_json(child)))
                .collect(),
        );
    }

    let mut values: Vec<serde_json::Value> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| kdl_to_json(e.value()))
        .collect();

    match values.len() {
        0 => serde_json::Value::Bool(true),
        1 => values.remove(0),
        _ => serde_json::Value::Array(values),
    }
}
