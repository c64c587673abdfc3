//! Escaping and auto-linking of validator text.
//!
//! Links found in messages are pointed at the outgoing redirector, signed with
//! HMAC-SHA256 so the redirector only follows URLs this server produced.

use hmac::{Hmac, Mac};
use linkify::{LinkFinder, LinkKind};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::config::RedirectSettings;

type HmacSha256 = Hmac<Sha256>;

/// Builds signed redirector URLs.
#[derive(Debug, Clone)]
pub struct OutgoingLinker {
    base_url: String,
    secret: SecretString,
}

impl OutgoingLinker {
    pub fn new(settings: &RedirectSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            secret: settings.secret_key.clone(),
        }
    }

    /// `{base}/{hex hmac}/{percent-encoded url}`
    pub fn redirect_url(&self, url: &str) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) else {
            return url.to_string();
        };
        mac.update(url.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        format!(
            "{}/{}/{}",
            self.base_url,
            signature,
            urlencoding::encode(url)
        )
    }

    /// HTML-escape `text` and turn every URL in it into a nofollow anchor.
    pub fn linkify_escaped(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        let finder = LinkFinder::new();
        for link in finder
            .links(text)
            .filter(|link| *link.kind() == LinkKind::Url)
        {
            out.push_str(&escape_html(&text[last..link.start()]));
            let url = link.as_str();
            out.push_str(&format!(
                "<a href=\"{}\" rel=\"nofollow\">{}</a>",
                escape_html(&self.redirect_url(url)),
                escape_html(url)
            ));
            last = link.end();
        }
        out.push_str(&escape_html(&text[last..]));
        out
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
