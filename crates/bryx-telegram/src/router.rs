use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use bryx_core::{
    config::Config,
    crm::CrmApi,
    messaging::port::MessagingPort,
    router::Router,
    security::AllowList,
};

use crate::handlers;
use crate::TelegramMessenger;

pub struct AppState {
    pub router: Router,
}

/// Verify the bot credential, then long-poll until Ctrl-C.
///
/// A failing `getMe` aborts before any update is consumed.
pub async fn run_polling<C>(cfg: Arc<Config>, crm: Arc<C>) -> anyhow::Result<()>
where
    C: CrmApi + 'static,
{
    let bot = Bot::new(cfg.bot_token.clone());

    info!("starting Bryx bot");
    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed; check BOT_TOKEN")?;
    info!(username = %me.username(), "bot started");

    let allow_list = Arc::new(AllowList::new(crm.clone(), cfg.users_refresh_interval));

    // Warm the cache; failures only mean the first query fetches again.
    {
        let allow_list = allow_list.clone();
        tokio::spawn(async move {
            allow_list.refresh().await;
            info!(count = allow_list.len(), "initial allow-list loaded");
        });
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        router: Router::new(allow_list, crm, messenger),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("polling stopped");
    Ok(())
}
