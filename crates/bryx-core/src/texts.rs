//! Fixed user-facing replies.

pub const ACCESS_DENIED: &str = "⛔ Доступ запрещен. Обратитесь к администратору для добавления вашего @username в список разрешённых пользователей.";

pub const WELCOME_CONFIRMED: &str = "👋 Добро пожаловать в Bryx CRM Bot!

✅ Вы подтверждены и можете использовать бота.

Используйте /help для просмотра доступных команд.
Используйте /menu для доступа к главному меню.";

pub const WELCOME_PENDING: &str = "👋 Здравствуйте!

⏳ Ваша заявка на доступ к Bryx CRM Bot отправлена администратору.

Пожалуйста, ожидайте подтверждения. После подтверждения вы сможете использовать все функции бота.

Попробуйте снова отправить /start через некоторое время, чтобы проверить статус.";

pub const WELCOME_DEFAULT: &str = "👋 Добро пожаловать в Bryx CRM Bot!

Я помогу вам управлять вашей CRM системой через Telegram.

Используйте /help для просмотра доступных команд.
Используйте /menu для доступа к главному меню.";

pub const SET_USERNAME: &str = "👋 Здравствуйте!

⚠️ У вас не установлен Telegram username.

Для использования бота необходимо установить username в настройках Telegram:
Settings → Edit Profile → Username

После установки username отправьте /start снова.";

pub const HELP: &str = "📚 Доступные команды:

/start - Приветственное сообщение
/help - Список команд
/menu - Главное меню
/products - Просмотр товаров
/sales - Просмотр продаж
/stats - Статистика";

pub const MENU_PROMPT: &str = "Выберите раздел:";
pub const MENU_ROWS: [[&str; 2]; 2] = [["📦 Товары", "💰 Продажи"], ["📊 Статистика", "ℹ️ Помощь"]];

pub const UNKNOWN_COMMAND: &str =
    "Неизвестная команда. Используйте /help для просмотра доступных команд.";

pub const PRODUCTS_EMPTY: &str = "📦 Товары не найдены";
pub const PRODUCTS_UNAVAILABLE: &str =
    "Не удалось получить данные о товарах. Проверьте, что CRM запущена.";

pub const SALES_EMPTY: &str = "💰 Продажи не найдены";
pub const SALES_UNAVAILABLE: &str =
    "Не удалось получить данные о продажах. Проверьте, что CRM запущена.";

pub const STATS_EMPTY: &str = "Не удалось получить статистику";
pub const STATS_UNAVAILABLE: &str = "Не удалось получить статистику. Проверьте, что CRM запущена.";

/// Transport or decoding failure in any listing handler.
pub const FETCH_FAILED: &str =
    "Произошла ошибка при получении данных. Убедитесь, что CRM запущена.";

pub const SHIPPED_MARKER: &str = "\n\n✅ <b>Статус: Отправлено</b>";
pub const SHIP_OK: &str = "✅ Продажа отмечена как отправленная!";
pub const SHIP_REJECTED: &str = "❌ Ошибка при обновлении статуса. Проверьте CRM.";
pub const SHIP_FAILED: &str = "❌ Ошибка при обновлении статуса.";
pub const CALLBACK_FAILED: &str = "Произошла ошибка. Попробуйте позже.";
