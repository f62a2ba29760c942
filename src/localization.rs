use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

use crate::locale::Locale;

const UZ_LATIN_RESOURCE: &str = include_str!("../locales/uz/main.ftl");
const UZ_CYRILLIC_RESOURCE: &str = include_str!("../locales/kr/main.ftl");

/// Localization manager for the bot's own UI strings (greeting, buttons, errors).
///
/// Topic text lives in the content catalog, not here.
pub struct LocalizationManager {
    bundles: HashMap<Locale, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager from the embedded Fluent resources
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for locale in Locale::ALL {
            bundles.insert(locale, Self::create_bundle(locale, Self::resource_for(locale))?);
        }
        Ok(Self { bundles })
    }

    fn resource_for(locale: Locale) -> &'static str {
        match locale {
            Locale::UzLatin => UZ_LATIN_RESOURCE,
            Locale::UzCyrillic => UZ_CYRILLIC_RESOURCE,
        }
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: Locale, source: &str) -> Result<FluentBundle<FluentResource>> {
        let langid: LanguageIdentifier = locale.language_tag().parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Telegram renders the bidi isolation marks literally.
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific locale
    pub fn get_message_in_language(
        &self,
        key: &str,
        locale: Locale,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let Some(bundle) = self.bundles.get(&locale).or_else(|| self.bundles.get(&Locale::PRIMARY))
        else {
            return format!("Missing translation: {key}");
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message without arguments
    pub fn get_message(&self, key: &str, locale: Locale) -> String {
        self.get_message_in_language(key, locale, None)
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, locale: Locale, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, locale, Some(&args_map))
    }
}
