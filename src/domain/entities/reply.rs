use serde::{Serialize, Serializer};

/// Sidebar color of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Good,
    Danger,
    Warning,
    Neutral,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Good => "good",
            Color::Danger => "danger",
            Color::Warning => "warning",
            Color::Neutral => "#D9D9D9",
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Label/value pair rendered inside an attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: false,
        }
    }

    pub fn short(mut self) -> Self {
        self.short = true;
        self
    }
}

/// Rich content block attached to a chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

impl Attachment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_field(mut self, field: AttachmentField) -> Self {
        self.fields.push(field);
        self
    }
}

/// An outgoing chat message: optional text plus attachments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Reply {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn attachment(attachment: Attachment) -> Self {
        Self {
            text: String::new(),
            attachments: vec![attachment],
        }
    }

    /// Color of the first attachment
    pub fn color(&self) -> Option<Color> {
        self.attachments.first().and_then(|a| a.color)
    }
}
