//! Plain-text rendering of markets for the CLI.

use std::fmt::Write;

use crate::market::MarketInfo;
use crate::query::{CategorySummary, MarketStats, Page};
use crate::utils::truncate_chars;

const RULE_WIDTH: usize = 140;
const TITLE_WIDTH: usize = 60;

/// Horizontal rule used between sections.
pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render a page of markets as a fixed-width table.
pub fn markets_table(page: &Page) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<60}  {:>9}  {:<17}  {:<10}  {:<19}  {:<8}  {:>6}",
        "#", "Title", "Price", "Range", "Category", "Ends", "Status", "Tokens"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    let offset = (page.page.max(1) as usize - 1).saturating_mul(page.limit);
    for (i, market) in page.items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>9}  {:<17}  {:<10}  {:<19}  {:<8}  {:>6}",
            offset.saturating_add(i + 1),
            truncate_chars(&market.title, TITLE_WIDTH),
            format!("${:.4}", market.current_price),
            market.price_range,
            truncate_chars(&market.category, 10),
            truncate_chars(&market.end_date_formatted, 19),
            market.status_label(),
            market.total_tokens,
            width = TITLE_WIDTH
        );
    }

    let _ = writeln!(
        out,
        "page {}/{} ({} matching markets{})",
        page.page,
        page.total_pages,
        page.total,
        if page.has_more { ", more available" } else { "" }
    );
    out
}

/// Render summary counts and the category distribution.
pub fn stats_summary(stats: &MarketStats, categories: &[CategorySummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Statistics:");
    let _ = writeln!(out, "  - Active markets:   {}/{}", stats.active_count, stats.total);
    let _ = writeln!(out, "  - Settled markets:  {}/{}", stats.closed_count, stats.total);
    let _ = writeln!(
        out,
        "  - Accepting orders: {}/{}",
        stats.accepting_orders_count, stats.total
    );
    let _ = writeln!(out, "\nCategories:");
    for category in categories {
        let _ = writeln!(out, "  - {}: {} markets", category.display_name, category.count);
    }
    out
}

/// Render every field of one market.
pub fn market_detail(market: &MarketInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title:            {}", market.title);
    let _ = writeln!(out, "Description:      {}", truncate_chars(&market.description, 200));
    let _ = writeln!(out, "Market ID:        {}", market.market_id);
    let _ = writeln!(out, "Condition ID:     {}", market.condition_id);
    let _ = writeln!(out, "Category:         {}", market.category);
    let _ = writeln!(out, "Status:           {}", market.status_label());
    let _ = writeln!(out, "Accepting orders: {}", market.accepting_orders);
    let _ = writeln!(out, "Current price:    ${:.4}", market.current_price);
    let _ = writeln!(out, "Price range:      {}", market.price_range);
    let _ = writeln!(out, "Tokens:           {}", market.total_tokens);
    let _ = writeln!(out, "Winning outcome:  {}", market.winning_outcome);
    let _ = writeln!(out, "Ends:             {}", market.end_date_formatted);
    let _ = writeln!(out, "Game start:       {}", market.game_start_formatted);
    let _ = writeln!(out, "Min order size:   ${}", market.minimum_order_size);
    let _ = writeln!(out, "Min tick size:    ${}", market.minimum_tick_size);
    let _ = writeln!(
        out,
        "Risk type:        {}",
        if market.neg_risk { "negative risk" } else { "standard" }
    );
    let _ = writeln!(out, "Tags:             {}", market.tags.join(", "));
    out
}
