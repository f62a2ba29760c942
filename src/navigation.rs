//! # Navigation Module
//!
//! The menu/answer state machine. A [`Navigator`] turns a [`NavigationToken`]
//! into the next [`Screen`]. It never talks to Telegram itself: the caller
//! decides whether the screen edits the originating message or goes out as a
//! new one.
//!
//! ```text
//!            ShowPage / GoBack / SwitchLocale
//!           +-------------------------------+
//!           v                               |
//!   Menu(page, locale) --ShowAnswer--> Answer(key, page, locale)
//!           ^                               |
//!           +------------GoBack-------------+
//! ```

use std::sync::Arc;
use teloxide::types::UserId;
use tracing::{debug, warn};

use crate::content::{ContentStore, TopicKey};
use crate::deep_link;
use crate::locale::Locale;
use crate::locale_store::LocaleResolver;
use crate::localization::LocalizationManager;
use crate::pager::paginate;
use crate::token::NavigationToken;

/// Topic linked from the greeting as a deep-link example.
const EXAMPLE_TOPIC: &str = "madina_3kun";

pub const PREV_PAGE_LABEL: &str = "◀";
pub const NEXT_PAGE_LABEL: &str = "▶";

/// What pressing a control does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Navigate(NavigationToken),
    Url(String),
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub action: ControlAction,
}

impl Control {
    pub fn navigate(label: impl Into<String>, token: NavigationToken) -> Self {
        Self {
            label: label.into(),
            action: ControlAction::Navigate(token),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ControlAction::Url(url.into()),
        }
    }

    pub fn token(&self) -> Option<&NavigationToken> {
        match &self.action {
            ControlAction::Navigate(token) => Some(token),
            ControlAction::Url(_) => None,
        }
    }
}

/// Rendered text plus rows of controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    pub text: String,
    pub rows: Vec<Vec<Control>>,
}

impl Screen {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    /// All navigation tokens on the screen, row by row.
    pub fn tokens(&self) -> impl Iterator<Item = &NavigationToken> {
        self.rows.iter().flatten().filter_map(Control::token)
    }
}

/// The state a rendered screen represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Menu { page: u32, locale: Locale },
    Answer { key: TopicKey, page: u32, locale: Locale },
    NotFound { key: TopicKey, page: u32, locale: Locale },
}

/// A screen together with the state it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub state: NavState,
    pub screen: Screen,
}

/// Interprets navigation tokens against the catalog, pager and locale preferences.
pub struct Navigator {
    content: Arc<ContentStore>,
    localization: Arc<LocalizationManager>,
    resolver: Arc<LocaleResolver>,
    keys: Vec<TopicKey>,
    page_size: usize,
    bot_username: Option<String>,
}

impl Navigator {
    pub fn new(
        content: Arc<ContentStore>,
        localization: Arc<LocalizationManager>,
        resolver: Arc<LocaleResolver>,
        page_size: usize,
    ) -> Self {
        let keys = content.ordered_keys();
        Self {
            content,
            localization,
            resolver,
            keys,
            page_size: page_size.max(1),
            bot_username: None,
        }
    }

    /// Enables the deep-link example in the greeting.
    pub fn with_bot_username(mut self, bot_username: impl Into<String>) -> Self {
        self.bot_username = Some(bot_username.into());
        self
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn localization(&self) -> &LocalizationManager {
        &self.localization
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }

    /// Apply a token on behalf of `user` and render the next screen.
    ///
    /// `SwitchLocale` persists the new locale first; a storage failure is
    /// logged and the menu is still rendered in the requested locale.
    pub async fn apply(&self, user: UserId, token: &NavigationToken) -> Rendered {
        debug!(user_id = %user, token = %token, "Applying navigation token");
        match token {
            NavigationToken::ShowPage { page, locale } => self.menu(i64::from(*page), *locale),
            NavigationToken::SwitchLocale { locale, page } => {
                if let Err(e) = self.resolver.set(user, *locale).await {
                    warn!(user_id = %user, error = %e, "Failed to persist locale switch");
                }
                self.menu(i64::from(*page), *locale)
            }
            NavigationToken::ShowAnswer { key, locale, page } => self.answer(key, *locale, *page),
            NavigationToken::GoBack { locale, page } => self.menu(i64::from(*page), *locale),
        }
    }

    /// `Menu(page, locale)`, with the page clamped into range.
    pub fn menu(&self, page: i64, locale: Locale) -> Rendered {
        let slice = paginate(page, &self.keys, self.page_size);
        let page = u32::try_from(slice.page).unwrap_or(u32::MAX);

        let mut rows: Vec<Vec<Control>> = slice
            .items
            .iter()
            .map(|key| {
                let title = self
                    .content
                    .title_of(key, locale)
                    .unwrap_or_else(|_| key.to_string());
                vec![Control::navigate(
                    title,
                    NavigationToken::ShowAnswer {
                        key: key.clone(),
                        locale,
                        page,
                    },
                )]
            })
            .collect();

        let mut nav = Vec::new();
        if slice.has_prev {
            nav.push(Control::navigate(
                PREV_PAGE_LABEL,
                NavigationToken::ShowPage { page: page - 1, locale },
            ));
        }
        if slice.has_next {
            nav.push(Control::navigate(
                NEXT_PAGE_LABEL,
                NavigationToken::ShowPage { page: page + 1, locale },
            ));
        }
        if !nav.is_empty() {
            rows.push(nav);
        }

        rows.push(
            Locale::ALL
                .into_iter()
                .map(|target| {
                    Control::navigate(
                        target.label(),
                        NavigationToken::SwitchLocale { locale: target, page },
                    )
                })
                .collect(),
        );

        Rendered {
            state: NavState::Menu { page, locale },
            screen: Screen {
                text: self.greeting(locale),
                rows,
            },
        }
    }

    /// `Answer(key, page, locale)`, or the not-found screen for unknown keys.
    pub fn answer(&self, key: &TopicKey, locale: Locale, page: u32) -> Rendered {
        let back = vec![vec![Control::navigate(
            self.localization.get_message("back-button", locale),
            NavigationToken::GoBack { locale, page },
        )]];

        match self.content.answer_text(key, locale) {
            Ok(text) => Rendered {
                state: NavState::Answer {
                    key: key.clone(),
                    page,
                    locale,
                },
                screen: Screen { text, rows: back },
            },
            Err(_) => {
                debug!(topic = %key, "Requested topic is not in the catalog");
                Rendered {
                    state: NavState::NotFound {
                        key: key.clone(),
                        page,
                        locale,
                    },
                    screen: Screen {
                        text: self.localization.get_message("topic-not-found", locale),
                        rows: back,
                    },
                }
            }
        }
    }

    fn greeting(&self, locale: Locale) -> String {
        let greeting = self.localization.get_message("menu-greeting", locale);
        let example = TopicKey::new(EXAMPLE_TOPIC)
            .ok()
            .filter(|key| self.content.contains(key));

        match (self.bot_username.as_deref(), example) {
            (Some(bot), Some(key)) => {
                let link = deep_link::start_link(bot, &deep_link::topic_payload(&key));
                let line = self
                    .localization
                    .get_message_with_args("menu-example", locale, &[("link", link.as_str())]);
                format!("{greeting}\n{line}")
            }
            _ => greeting,
        }
    }
}
