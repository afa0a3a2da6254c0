// References:
// 1. https://github.com/clitic/vsd/blob/30ca1985e4a467ea3304b11c08d3176deaafd22a/vsd/src/dash/template.rs
// 2. https://github.com/emarsden/dash-mpd-rs/blob/6ebdfb4759adbda8233b5b3520804e23ff86e7de/src/fetch.rs#L435-L466

use regex::{Regex, Replacer};
use std::{collections::HashMap, sync::LazyLock};

// Only %0[width]d is permitted as a format tag, so the replacement is done by hand.
//
// Example template: "$RepresentationID$/$Number%06d$.m4s"
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(RepresentationID|Number|Time|Bandwidth)(?:%0([\d])d)?\$").unwrap()
});

/// Values substituted into segment URL templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    args: HashMap<&'static str, String>,
}

impl Template {
    pub const REPRESENTATION_ID: &'static str = "RepresentationID";
    pub const NUMBER: &'static str = "Number";
    pub const TIME: &'static str = "Time";
    pub const BANDWIDTH: &'static str = "Bandwidth";

    pub fn new() -> Self {
        Self {
            args: HashMap::with_capacity(4),
        }
    }

    /// Template pre-filled with the variables that do not change between segments.
    pub fn for_representation(representation_id: &str, bandwidth: u64) -> Self {
        let mut template = Self::new();
        template
            .insert(Self::REPRESENTATION_ID, representation_id.to_string())
            .insert(Self::BANDWIDTH, bandwidth.to_string());
        template
    }

    pub fn insert(&mut self, key: &'static str, value: String) -> &mut Self {
        self.args.insert(key, value);
        self
    }

    pub fn resolve(&self, template: &str) -> String {
        TEMPLATE_REGEX
            .replace_all(template, TemplateReplacer(&self.args))
            .to_string()
    }
}

struct TemplateReplacer<'a>(&'a HashMap<&'static str, String>);

impl Replacer for TemplateReplacer<'_> {
    fn replace_append(&mut self, caps: &regex::Captures<'_>, dst: &mut String) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            return;
        };
        let Some(value) = self.0.get(key.as_str()) else {
            dst.push_str(whole.as_str());
            return;
        };

        match caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok()) {
            Some(width) => dst.push_str(&format!("{value:0>width$}")),
            None => dst.push_str(value),
        }
    }
}
