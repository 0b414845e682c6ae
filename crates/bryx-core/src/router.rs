//! Command dispatch.
//!
//! The router owns the request flow for every inbound update:
//! - classify (text command vs callback)
//! - check the allow-list (`/start` is exempt)
//! - call the CRM through the port and render the reply
//!
//! Handler failures are logged and turned into fixed replies here; nothing
//! propagates back to the transport.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    crm::{models::RegistrationRequest, CrmApi, LIST_PAGE_SIZE},
    domain::{ChatId, SaleId},
    errors::Error,
    formatting::{escape_html, format_products, format_sales, format_stats},
    messaging::{
        port::MessagingPort,
        types::{
            CallbackMessage, CallbackQuery, IncomingUpdate, ReplyKeyboard, TextMessage, TextMode,
        },
    },
    security::AllowList,
    texts,
};

/// Callback data prefix of the "mark as shipped" button: `ship_<sale id>`.
pub const SHIP_PREFIX: &str = "ship_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Menu,
    Products,
    Sales,
    Stats,
    Unknown,
}

impl Command {
    /// Classify by the first whitespace-delimited token.
    ///
    /// Telegram may send `/cmd@botname` in groups; the suffix is ignored.
    pub fn parse(text: &str) -> Self {
        let first = text.split_whitespace().next().unwrap_or("");
        let name = first.split('@').next().unwrap_or("");
        match name {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/menu" => Command::Menu,
            "/products" => Command::Products,
            "/sales" => Command::Sales,
            "/stats" => Command::Stats,
            _ => Command::Unknown,
        }
    }
}

/// `ship_<digits>` -> sale id. Anything else is not a ship action.
pub fn parse_ship_action(data: &str) -> Option<SaleId> {
    let raw = data.strip_prefix(SHIP_PREFIX)?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok().map(SaleId)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Reply {
    text: String,
    keyboard: Option<ReplyKeyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

pub struct Router {
    allow_list: Arc<AllowList>,
    crm: Arc<dyn CrmApi>,
    messenger: Arc<dyn MessagingPort>,
}

impl Router {
    pub fn new(
        allow_list: Arc<AllowList>,
        crm: Arc<dyn CrmApi>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            allow_list,
            crm,
            messenger,
        }
    }

    pub fn allow_list(&self) -> &Arc<AllowList> {
        &self.allow_list
    }

    pub async fn handle(&self, update: IncomingUpdate) {
        match update {
            IncomingUpdate::Text(msg) => self.handle_text(msg).await,
            IncomingUpdate::Callback(q) => self.handle_callback(q).await,
        }
    }

    pub async fn handle_text(&self, msg: TextMessage) {
        info!(
            username = msg.sender.display_name(),
            user_id = msg.sender.id.0,
            text = %msg.text,
            "message received"
        );

        let command = Command::parse(&msg.text);

        // Unregistered users must be able to ask for access.
        let reply = if command == Command::Start {
            self.start(&msg).await
        } else if !self
            .allow_list
            .is_authorized(msg.sender.username.as_deref())
            .await
        {
            warn!(
                username = msg.sender.display_name(),
                user_id = msg.sender.id.0,
                "unauthorized access attempt"
            );
            Reply::text(texts::ACCESS_DENIED)
        } else {
            self.dispatch(command).await
        };

        self.send(msg.chat_id, reply).await;
    }

    async fn dispatch(&self, command: Command) -> Reply {
        match command {
            Command::Help => Reply::text(texts::HELP),
            Command::Menu => menu(),
            Command::Products => self.products().await,
            Command::Sales => self.sales().await,
            Command::Stats => self.stats().await,
            Command::Start | Command::Unknown => Reply::text(texts::UNKNOWN_COMMAND),
        }
    }

    async fn start(&self, msg: &TextMessage) -> Reply {
        let Some(username) = msg.sender.username.clone().filter(|u| !u.is_empty()) else {
            return Reply::text(texts::SET_USERNAME);
        };

        let req = RegistrationRequest {
            username,
            chat_id: msg.chat_id.0.to_string(),
            first_name: msg.sender.first_name.clone(),
            last_name: msg.sender.last_name.clone(),
        };

        match self.crm.register_user(&req).await {
            Ok(resp) => {
                info!(
                    username = %req.username,
                    chat_id = msg.chat_id.0,
                    is_confirmed = resp.is_confirmed,
                    "user registered"
                );
                if resp.is_confirmed {
                    Reply::text(texts::WELCOME_CONFIRMED)
                } else {
                    Reply::text(texts::WELCOME_PENDING)
                }
            }
            // 2xx without a body: the CRM did not confirm.
            Err(Error::EmptyBody) => Reply::text(texts::WELCOME_PENDING),
            Err(e) => {
                error!(error = %e, username = %req.username, "user registration failed");
                Reply::text(texts::WELCOME_DEFAULT)
            }
        }
    }

    async fn products(&self) -> Reply {
        match self.crm.list_products(LIST_PAGE_SIZE).await {
            Ok(page) => Reply::text(
                format_products(&page).unwrap_or_else(|| texts::PRODUCTS_EMPTY.to_string()),
            ),
            Err(Error::EmptyBody) => Reply::text(texts::PRODUCTS_EMPTY),
            Err(e) => {
                error!(error = %e, "failed to fetch products");
                Reply::text(failure_text(&e, texts::PRODUCTS_UNAVAILABLE))
            }
        }
    }

    async fn sales(&self) -> Reply {
        match self.crm.list_sales(LIST_PAGE_SIZE).await {
            Ok(page) => Reply::text(
                format_sales(&page).unwrap_or_else(|| texts::SALES_EMPTY.to_string()),
            ),
            Err(Error::EmptyBody) => Reply::text(texts::SALES_EMPTY),
            Err(e) => {
                error!(error = %e, "failed to fetch sales");
                Reply::text(failure_text(&e, texts::SALES_UNAVAILABLE))
            }
        }
    }

    async fn stats(&self) -> Reply {
        match self.crm.stats().await {
            Ok(stats) => Reply::text(format_stats(&stats)),
            Err(Error::EmptyBody) => Reply::text(texts::STATS_EMPTY),
            Err(e) => {
                error!(error = %e, "failed to fetch stats");
                Reply::text(failure_text(&e, texts::STATS_UNAVAILABLE))
            }
        }
    }

    pub async fn handle_callback(&self, q: CallbackQuery) {
        let (Some(data), Some(origin)) = (q.data.as_deref(), q.message.as_ref()) else {
            return;
        };

        info!(
            data,
            username = q.sender.display_name(),
            user_id = q.sender.id.0,
            "callback received"
        );

        if !self
            .allow_list
            .is_authorized(q.sender.username.as_deref())
            .await
        {
            warn!(
                username = q.sender.display_name(),
                user_id = q.sender.id.0,
                "unauthorized callback attempt"
            );
            self.answer(&q.callback_id, texts::ACCESS_DENIED, true)
                .await;
            return;
        }

        let Some(sale_id) = parse_ship_action(data) else {
            debug!(data, "ignoring unrecognized callback");
            return;
        };

        self.ship(&q.callback_id, origin, sale_id).await;
    }

    async fn ship(&self, callback_id: &str, origin: &CallbackMessage, sale_id: SaleId) {
        if let Err(e) = self.crm.ship_sale(sale_id).await {
            error!(error = %e, sale_id = sale_id.0, "failed to mark sale as shipped");
            let notice = if e.is_api_status() {
                texts::SHIP_REJECTED
            } else {
                texts::SHIP_FAILED
            };
            self.answer(callback_id, notice, true).await;
            return;
        }

        let original = origin.text.as_deref().unwrap_or("");
        let updated = format!("{}{}", escape_html(original), texts::SHIPPED_MARKER);
        if let Err(e) = self
            .messenger
            .edit_text(origin.msg, &updated, TextMode::Html)
            .await
        {
            error!(error = %e, sale_id = sale_id.0, "failed to edit shipped sale message");
            self.answer(callback_id, texts::CALLBACK_FAILED, true).await;
            return;
        }

        self.answer(callback_id, texts::SHIP_OK, false).await;
        info!(sale_id = sale_id.0, "sale marked as shipped");
    }

    async fn send(&self, chat_id: ChatId, reply: Reply) {
        if let Err(e) = self
            .messenger
            .send_text(chat_id, &reply.text, reply.keyboard)
            .await
        {
            error!(error = %e, chat_id = chat_id.0, "failed to send reply");
        }
    }

    async fn answer(&self, callback_id: &str, text: &str, show_alert: bool) {
        if let Err(e) = self
            .messenger
            .answer_callback_query(callback_id, Some(text), show_alert)
            .await
        {
            error!(error = %e, "failed to answer callback query");
        }
    }
}

fn menu() -> Reply {
    let rows = texts::MENU_ROWS
        .iter()
        .map(|row| row.iter().map(|l| l.to_string()).collect())
        .collect();
    Reply {
        text: texts::MENU_PROMPT.to_string(),
        keyboard: Some(ReplyKeyboard::new(rows).resized()),
    }
}

/// Non-2xx answers get the handler's own text; transport and decoding
/// failures share one.
fn failure_text(err: &Error, unavailable: &'static str) -> &'static str {
    if err.is_api_status() {
        unavailable
    } else {
        texts::FETCH_FAILED
    }
}
