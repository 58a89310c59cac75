//! User-facing message catalog.
//!
//! Every string the panel ever shows lives here, for two reasons:
//!
//! 1. **Single source of truth** — the wording of a status line changes in
//!    exactly one place.
//! 2. **Localisation** — the defaults are Russian (matching the service the
//!    panel was built for), but callers can swap the whole catalog via
//!    [`crate::config::PanelConfigBuilder::messages`].
//!
//! Count-bearing templates use a literal `{count}` placeholder, substituted
//! by the `*_line` helpers. Templates are plain `String`s rather than format
//! machinery so a catalog can be loaded from configuration verbatim.

use once_cell::sync::Lazy;

static DEFAULT_CATALOG: Lazy<MessageCatalog> = Lazy::new(|| MessageCatalog {
    idle: "Готово к работе. Загрузите PDF.".into(),
    uploading: "Загрузка файлов...".into(),
    uploaded: "Загружено PDF: {count}".into(),
    starting: "Запуск задачи...".into(),
    running: "Идёт обработка... Загружено файлов: {count}".into(),
    waiting: "Ожидание. Загружено файлов: {count}".into(),
    downloading: "Скачивание результата...".into(),
    placeholder_log: "Ожидание ответа сервера...".into(),
    generic_error: "Неизвестная ошибка".into(),
});

/// The full set of status and log strings used by the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    /// Pristine status line shown before any upload and after a reset.
    pub idle: String,
    /// Status line while an upload request is in flight.
    pub uploading: String,
    /// Status line after `/upload` acknowledged `{count}` accepted files.
    pub uploaded: String,
    /// Status line while a start request is in flight.
    pub starting: String,
    /// Status line while the server reports a running job.
    pub running: String,
    /// Status line when idle with `{count}` files already uploaded.
    pub waiting: String,
    /// Status line while the result download is in flight.
    pub downloading: String,
    /// Single placeholder log line shown while waiting for the server.
    pub placeholder_log: String,
    /// Fallback alert text when the server sent no error message.
    pub generic_error: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        DEFAULT_CATALOG.clone()
    }
}

impl MessageCatalog {
    /// Status line for a running job, embedding the uploaded count.
    pub fn running_line(&self, uploaded: u32) -> String {
        fill_count(&self.running, uploaded)
    }

    /// Status line for an idle server: the pristine message when nothing is
    /// uploaded, the counted waiting message otherwise.
    pub fn idle_line(&self, uploaded: u32) -> String {
        if uploaded == 0 {
            self.idle.clone()
        } else {
            fill_count(&self.waiting, uploaded)
        }
    }

    /// Status line after a successful upload of `count` files.
    pub fn uploaded_line(&self, count: u32) -> String {
        fill_count(&self.uploaded, count)
    }

    /// Alert text for a server error, falling back to the generic message
    /// when the server-provided one is blank.
    pub fn alert_or_fallback(&self, message: &str) -> String {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            self.generic_error.clone()
        } else {
            trimmed.to_string()
        }
    }
}

fn fill_count(template: &str, count: u32) -> String {
    template.replace("{count}", &count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_line_embeds_count() {
        let m = MessageCatalog::default();
        let line = m.running_line(3);
        assert!(line.contains('3'), "got: {line}");
        assert_ne!(line, m.running, "placeholder must be substituted");
    }

    #[test]
    fn idle_line_without_uploads_is_pristine() {
        let m = MessageCatalog::default();
        assert_eq!(m.idle_line(0), m.idle);
    }

    #[test]
    fn idle_line_with_uploads_differs_from_running() {
        let m = MessageCatalog::default();
        let idle = m.idle_line(2);
        let running = m.running_line(2);
        assert!(idle.contains('2'));
        assert_ne!(idle, running, "wording must differ by running state");
    }

    #[test]
    fn fallback_replaces_blank_server_message() {
        let m = MessageCatalog::default();
        assert_eq!(m.alert_or_fallback("  "), m.generic_error);
        assert_eq!(m.alert_or_fallback("no result"), "no result");
    }

    #[test]
    fn custom_catalog_survives_helpers() {
        let m = MessageCatalog {
            running: "processing {count} file(s)".into(),
            ..MessageCatalog::default()
        };
        assert_eq!(m.running_line(5), "processing 5 file(s)");
    }
}
