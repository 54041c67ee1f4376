//! The countdown board: every card computed for one tick, plus text rendering

use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use tracing::warn;

use crate::boundary::BoundaryKind;
use crate::calendar::Calendar;
use crate::duration::Countdown;
use crate::target::{CustomTarget, SharedTarget};

/// Where a card came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardSource {
    Builtin(BoundaryKind),
    Custom { id: String },
    Shared,
}

impl CardSource {
    pub fn icon(&self) -> &'static str {
        match self {
            CardSource::Builtin(kind) => kind.icon(),
            CardSource::Custom { .. } => "📌",
            CardSource::Shared => "🔗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub label: String,
    pub source: CardSource,
    pub deadline: DateTime<Tz>,
    pub remaining: Countdown,
    pub business_days: u32,
}

impl Card {
    fn new(
        calendar: &Calendar,
        now: &DateTime<Tz>,
        label: String,
        source: CardSource,
        deadline: DateTime<Tz>,
    ) -> Self {
        Self {
            label,
            source,
            remaining: Countdown::between(now, &deadline),
            business_days: calendar.business_days_between(now.date_naive(), deadline.date_naive()),
            deadline,
        }
    }
}

/// Rendering detail level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Detailed,
    /// Days and business days only
    Simple,
}

/// All cards for `now`, in display order: the shared target, custom targets
/// newest first, then the four built-in boundaries.
///
/// Custom and shared targets are shown only while their deadline is still
/// ahead of `now`. Custom rows with an unparseable date are skipped.
pub fn build_board(
    calendar: &Calendar,
    now: &DateTime<Tz>,
    custom: &[CustomTarget],
    shared: Option<&SharedTarget>,
) -> Vec<Card> {
    let mut cards = Vec::with_capacity(custom.len() + 5);

    if let Some(target) = shared {
        let deadline = target.deadline(calendar);
        if deadline > *now {
            cards.push(Card::new(calendar, now, target.label.clone(), CardSource::Shared, deadline));
        }
    }

    for target in custom.iter().rev() {
        let deadline = match target.deadline(calendar) {
            Ok(deadline) => deadline,
            Err(e) => {
                warn!("Skipping target '{}': {}", target.label, e);
                continue;
            }
        };
        if deadline > *now {
            let source = CardSource::Custom {
                id: target.id.clone(),
            };
            cards.push(Card::new(calendar, now, target.label.clone(), source, deadline));
        }
    }

    for kind in BoundaryKind::ALL {
        let deadline = kind.boundary(now);
        let source = CardSource::Builtin(kind);
        cards.push(Card::new(calendar, now, kind.label().to_string(), source, deadline));
    }

    cards
}

/// "2024年6月1日"
pub fn format_date(t: &DateTime<Tz>) -> String {
    format!("{}年{}月{}日", t.year(), t.month(), t.day())
}

/// "2024年6月1日 09:05", the board header
pub fn format_header(now: &DateTime<Tz>) -> String {
    format!("{} {:02}:{:02}", format_date(now), now.hour(), now.minute())
}

/// Render one card as text
pub fn render_card(card: &Card, mode: Mode) -> String {
    let head = format!("{} {} ({})", card.source.icon(), card.label, format_date(&card.deadline));
    match mode {
        Mode::Detailed => format!(
            "{}\n    {}  💼 営業日 {}日",
            head, card.remaining, card.business_days
        ),
        Mode::Simple => format!(
            "{}\n    {}日  営業日 {}日",
            head, card.remaining.days, card.business_days
        ),
    }
}

/// Render the header and every card
pub fn render_board(now: &DateTime<Tz>, cards: &[Card], mode: Mode) -> String {
    let mut out = format!("⏰ カウントダウン  {}\n", format_header(now));
    for card in cards {
        out.push('\n');
        out.push_str(&render_card(card, mode));
        out.push('\n');
    }
    out
}
