use std::sync::Arc;

use bryx_core::config::Config;
use bryx_crm::CrmClient;

#[tokio::main]
async fn main() -> Result<(), bryx_core::Error> {
    bryx_core::logging::init("bryx")?;

    let cfg = Arc::new(Config::load()?);

    let crm = Arc::new(CrmClient::new(&cfg.crm_api_url, cfg.crm_request_timeout)?);
    tracing::info!(base_url = crm.base_url(), "CRM client ready");

    bryx_telegram::router::run_polling(cfg, crm)
        .await
        .map_err(|e| bryx_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
