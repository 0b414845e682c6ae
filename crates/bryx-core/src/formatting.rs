//! Plain-text renderings of CRM listings.

use std::fmt::Write as _;

use crate::crm::models::{Product, ProductsResponse, Sale, SalesResponse, StatsResponse};

/// How many categories `/stats` lists.
pub const TOP_CATEGORIES: usize = 5;

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Two decimals with `,` thousands separators: `1234.5` -> `1,234.50`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    let negative = value < 0.0 && fixed != "0.00";
    format!("{}{grouped}.{frac}", if negative { "-" } else { "" })
}

/// `None` for an empty page (caller sends the "not found" reply).
pub fn format_products(page: &ProductsResponse) -> Option<String> {
    if page.products.is_empty() {
        return None;
    }
    let shown = page.products.len();

    let mut out = format!("📦 Товары (первые {shown} из {}):\n\n", page.total);
    for p in &page.products {
        push_product(&mut out, p);
    }
    if page.total > shown as i64 {
        let _ = write!(out, "Показано {shown} из {} товаров", page.total);
    }
    Some(out)
}

fn push_product(out: &mut String, p: &Product) {
    let favorite = if p.is_favorite { "⭐ " } else { "" };
    let defective = if p.is_defective { "⚠️ " } else { "" };
    let _ = writeln!(out, "{favorite}{defective}{}", p.name);
    let _ = writeln!(out, "  └ Категория: {}", p.category);
    let _ = writeln!(out, "  └ Цена: {} грн", format_amount(p.sale_price));
    let _ = writeln!(out, "  └ Статус: {}\n", p.status);
}

pub fn format_sales(page: &SalesResponse) -> Option<String> {
    if page.sales.is_empty() {
        return None;
    }
    let shown = page.sales.len();

    let mut out = format!("💰 Продажи (последние {shown} из {}):\n\n", page.total);
    for s in &page.sales {
        push_sale(&mut out, s);
    }
    if page.total > shown as i64 {
        let _ = write!(out, "Показано {shown} из {} продаж", page.total);
    }
    Some(out)
}

fn push_sale(out: &mut String, s: &Sale) {
    let date = s
        .sale_date
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "#{} - {}", s.id, s.buyer);
    let _ = writeln!(out, "  └ Дата: {date}");
    let _ = writeln!(out, "  └ Сумма: {} грн", format_amount(s.total_amount));
    let _ = writeln!(out, "  └ Товаров: {} шт.", s.product_count);
    let _ = writeln!(out, "  └ Статус: {}\n", s.status);
}

pub fn format_stats(stats: &StatsResponse) -> String {
    let p = &stats.products;
    let s = &stats.sales;

    let mut out = String::from("📊 Статистика Bryx CRM\n\n");

    out.push_str("📦 Товары:\n");
    let _ = writeln!(out, "  └ Всего: {}", p.total);
    let _ = writeln!(out, "  └ В наличии: {}", p.in_stock);
    let _ = writeln!(out, "  └ Продано: {}", p.sold);
    let _ = writeln!(out, "  └ Ожидается: {}\n", p.expected);

    out.push_str("💰 Продажи:\n");
    let _ = writeln!(out, "  └ Всего продаж: {}", s.total);
    let _ = writeln!(out, "  └ Общая сумма: {} грн", format_amount(s.total_amount));
    let _ = writeln!(out, "  └ Сегодня продаж: {}", s.today.count);
    let _ = writeln!(out, "  └ Сумма сегодня: {} грн\n", format_amount(s.today.amount));

    if !stats.categories.is_empty() {
        out.push_str("📋 Топ категорий:\n");
        for c in stats.categories.iter().take(TOP_CATEGORIES) {
            let _ = writeln!(out, "  └ {}: {} шт.", c.category, c.count);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::models::{parse_datetime, CategoryStats};

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            category: "Shoes".to_string(),
            sale_price: 1500.0,
            status: "InStock".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn amounts_use_n2_grouping() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-42.1), "-42.10");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn products_truncation_notice() {
        let page = ProductsResponse {
            total: 12,
            page: 1,
            page_size: 5,
            products: (1..=5).map(|i| product(&format!("P{i}"))).collect(),
        };
        let text = format_products(&page).unwrap();
        assert!(text.starts_with("📦 Товары (первые 5 из 12):\n\n"));
        assert!(text.ends_with("Показано 5 из 12 товаров"));
        assert!(text.contains("  └ Цена: 1,500.00 грн\n"));
    }

    #[test]
    fn products_without_truncation_and_markers() {
        let mut fav = product("Air");
        fav.is_favorite = true;
        fav.is_defective = true;
        let page = ProductsResponse {
            total: 1,
            products: vec![fav],
            ..Default::default()
        };
        let text = format_products(&page).unwrap();
        assert!(text.contains("⭐ ⚠️ Air\n"));
        assert!(!text.contains("Показано"));
    }

    #[test]
    fn empty_pages_render_nothing() {
        assert_eq!(format_products(&ProductsResponse::default()), None);
        assert_eq!(format_sales(&SalesResponse::default()), None);
    }

    #[test]
    fn sales_lines() {
        let page = SalesResponse {
            total: 8,
            sales: vec![Sale {
                id: 17,
                buyer: "Ivan".to_string(),
                sale_date: parse_datetime("2024-02-03T15:00:00"),
                total_amount: 2500.0,
                status: "Paid".to_string(),
                product_count: 2,
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = format_sales(&page).unwrap();
        assert!(text.starts_with("💰 Продажи (последние 1 из 8):\n\n#17 - Ivan\n"));
        assert!(text.contains("  └ Дата: 03.02.2024\n"));
        assert!(text.contains("  └ Сумма: 2,500.00 грн\n"));
        assert!(text.contains("  └ Товаров: 2 шт.\n"));
        assert!(text.ends_with("Показано 1 из 8 продаж"));
    }

    #[test]
    fn stats_lists_first_five_categories_in_order() {
        let mut stats = StatsResponse::default();
        stats.products.total = 40;
        stats.sales.today.count = 3;
        stats.categories = (1..=7)
            .map(|i| CategoryStats {
                category: format!("C{i}"),
                count: 10 - i,
            })
            .collect();

        let text = format_stats(&stats);
        let listed: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("📋"))
            .skip(1)
            .collect();
        assert_eq!(
            listed,
            vec![
                "  └ C1: 9 шт.",
                "  └ C2: 8 шт.",
                "  └ C3: 7 шт.",
                "  └ C4: 6 шт.",
                "  └ C5: 5 шт."
            ]
        );
        assert!(text.contains("  └ Всего: 40\n"));
        assert!(text.contains("  └ Сегодня продаж: 3\n"));
    }

    #[test]
    fn stats_without_categories_omits_section() {
        let text = format_stats(&StatsResponse::default());
        assert!(!text.contains("📋"));
    }
}
