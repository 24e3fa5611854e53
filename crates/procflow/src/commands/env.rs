use procflow_core::Ecosystem;

/// `KEY=VALUE` を1行ずつ出力（`export $(procflow env api)` で使える形）
pub async fn handle(ecosystem: &Ecosystem, app_name: &str, profile: Option<&str>) -> anyhow::Result<()> {
    let app = ecosystem.app(app_name)?;
    for (key, value) in app.resolve_env(profile)? {
        println!("{}={}", key, value);
    }
    Ok(())
}
