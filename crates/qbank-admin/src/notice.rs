//! Default notice sink: log through tracing.

use qbank_http::{Notice, NoticeLevel, NoticeSink};

pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => tracing::warn!("[notice] {}", notice.text),
            NoticeLevel::Error => tracing::error!("[notice] {}", notice.text),
        }
    }
}
