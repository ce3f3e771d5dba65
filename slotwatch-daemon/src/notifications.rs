//! Slot notifications.
//!
//! Records are rendered into one HTML message per dispatch. Long lists are
//! cut to a fixed number of cards followed by a "+N more" line; the message
//! is never split. Delivery is best-effort: failures are logged and
//! swallowed so a broken chat endpoint never stalls polling.

use std::fmt::Write as _;
use std::sync::Arc;

use slotwatch_core::{Messenger, OutboundMessage, Record};
use tracing::{debug, info, warn};

/// Maximum number of cards in one message.
pub const MAX_CARDS: usize = 10;

/// Message length limit of the chat endpoint, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const NEW_SLOTS_TITLE: &str = "🔥 New slots available!";
const SNAPSHOT_TITLE: &str = "📋 Open slots right now";
const BOOKING_LABEL: &str = "Go to booking";

// Placeholders for missing fields.
const NO_CATEGORY: &str = "Training";
const NO_DAY: &str = "Day not specified";
const NO_TIME: &str = "??";
const NO_LOCATION: &str = "Sports complex";
const NO_OWNER: &str = "Instructor not specified";

// ============================================================================
// Dispatcher
// ============================================================================

/// Sends rendered slot lists to the configured chat.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    booking_url: String,
}

impl Dispatcher {
    /// Creates a dispatcher whose messages link to `booking_url`.
    pub fn new(messenger: Arc<dyn Messenger>, booking_url: impl Into<String>) -> Self {
        Self {
            messenger,
            booking_url: booking_url.into(),
        }
    }

    /// Announces newly available records. Does nothing for an empty list.
    pub async fn dispatch(&self, records: &[Record]) {
        if records.is_empty() {
            return;
        }
        info!(records = records.len(), "Sending new slot notification");
        let text = render_slots(NEW_SLOTS_TITLE, records, &self.booking_url);
        self.send(OutboundMessage::html(text)).await;
    }

    /// Sends the full list of currently open records.
    pub async fn dispatch_snapshot(&self, records: &[Record]) {
        let text = render_slots(SNAPSHOT_TITLE, records, &self.booking_url);
        self.send(OutboundMessage::html(text)).await;
    }

    /// Delivers one message. Returns false if delivery failed.
    pub async fn send(&self, message: OutboundMessage) -> bool {
        match self.messenger.send(&message).await {
            Ok(()) => {
                debug!("Message sent");
                true
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Failed to send message");
                false
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders records into one HTML message.
///
/// At most [`MAX_CARDS`] cards are shown, fewer if the message would exceed
/// [`MAX_MESSAGE_CHARS`]; the rest are summarized as "+N more".
pub fn render_slots(title: &str, records: &[Record], booking_url: &str) -> String {
    let cards: Vec<String> = records.iter().take(MAX_CARDS).map(render_card).collect();

    let mut shown = cards.len();
    loop {
        let text = assemble(title, &cards[..shown], records.len() - shown, booking_url);
        if shown == 0 || text.chars().count() <= MAX_MESSAGE_CHARS {
            if shown < cards.len() {
                debug!(shown, total = records.len(), "Trimmed cards to fit message limit");
            }
            return text;
        }
        shown -= 1;
    }
}

fn assemble(title: &str, cards: &[String], remaining: usize, booking_url: &str) -> String {
    let mut text = format!("<b>{}</b>", escape_html(title));

    for card in cards {
        text.push_str("\n\n");
        text.push_str(card);
    }

    if remaining > 0 {
        let _ = write!(text, "\n\n<i>+{remaining} more</i>");
    }

    let _ = write!(
        text,
        "\n\n<a href=\"{}\"><b>{BOOKING_LABEL}</b></a>",
        escape_html(booking_url)
    );
    text
}

/// Renders one record. Missing fields fall back to placeholder text.
pub fn render_card(record: &Record) -> String {
    let field = |value: Option<&String>, placeholder: &str| {
        escape_html(value.map_or(placeholder, String::as_str))
    };

    format!(
        "🏟 <b>{}</b>\n🗓 {} | ⏰ {}\n📍 {}\n👤 {}\n🟢 Free seats: <b>{}</b>",
        field(record.category.as_ref(), NO_CATEGORY),
        field(record.schedule.day.as_ref(), NO_DAY),
        field(record.schedule.time.as_ref(), NO_TIME),
        field(record.location.as_ref(), NO_LOCATION),
        field(record.owner_name.as_ref(), NO_OWNER),
        record.capacity,
    )
}

/// Escapes text for the chat endpoint's HTML mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotwatch_core::Schedule;

    const LINK: &str = "https://lks.bmstu.ru/fv/new-record";

    fn slot(n: u32) -> Record {
        Record::with_capacity(n)
            .source_id(format!("g-{n}"))
            .category("Swimming")
            .schedule(Schedule::new("Monday", "10:15-11:50"))
            .location("Pool")
            .owner("Orlova T. V.")
    }

    fn card_count(text: &str) -> usize {
        text.matches("🏟").count()
    }

    #[test]
    fn test_fifteen_records_render_ten_cards() {
        let records: Vec<Record> = (1..=15).map(slot).collect();
        let text = render_slots(NEW_SLOTS_TITLE, &records, LINK);

        assert_eq!(card_count(&text), 10);
        assert!(text.contains("+5 more"));
        assert!(text.contains("Free seats: <b>10</b>"));
        assert!(!text.contains("Free seats: <b>11</b>"));
    }

    #[test]
    fn test_short_list_has_no_remainder() {
        let records: Vec<Record> = (1..=3).map(slot).collect();
        let text = render_slots(NEW_SLOTS_TITLE, &records, LINK);

        assert_eq!(card_count(&text), 3);
        assert!(!text.contains("more</i>"));
        assert!(text.ends_with(&format!("<a href=\"{LINK}\"><b>Go to booking</b></a>")));
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let card = render_card(&Record::with_capacity(2));

        assert!(card.contains("<b>Training</b>"));
        assert!(card.contains("Day not specified | ⏰ ??"));
        assert!(card.contains("Sports complex"));
        assert!(card.contains("Instructor not specified"));
        assert!(card.contains("Free seats: <b>2</b>"));
    }

    #[test]
    fn test_fields_are_escaped() {
        let record = Record::with_capacity(1)
            .category("<script>")
            .owner("Smith & Sons");
        let card = render_card(&record);

        assert!(card.contains("&lt;script&gt;"));
        assert!(card.contains("Smith &amp; Sons"));
        assert!(!card.contains("<script>"));
    }

    #[test]
    fn test_long_cards_are_trimmed_to_fit() {
        let long = "x".repeat(1000);
        let records: Vec<Record> = (1..=6)
            .map(|n| Record::with_capacity(n).category(long.clone()))
            .collect();

        let text = render_slots(NEW_SLOTS_TITLE, &records, LINK);

        assert!(text.chars().count() <= MAX_MESSAGE_CHARS);
        let shown = card_count(&text);
        assert!(shown < 6);
        assert!(text.contains(&format!("+{} more", 6 - shown)));
    }
}
