use std::collections::HashMap;

/// Display colours handed out to authors in first-seen order.
pub const AUTHOR_COLORS: [&str; 20] = [
    "#8B4513", "#556B2F", "#4682B4", "#6A5ACD", "#708090",
    "#2F4F4F", "#8B0000", "#B8860B", "#A0522D", "#5F9EA0",
    "#7B68EE", "#483D8B", "#2E8B57", "#4B0082", "#696969",
    "#8B008B", "#9932CC", "#8FBC8F", "#778899", "#6B8E23",
];

/// Per-session author to colour assignment. Wraps around once all colours
/// are taken.
#[derive(Debug, Default)]
pub struct AuthorPalette {
    assigned: HashMap<String, &'static str>,
}

impl AuthorPalette {
    pub fn color_for(&mut self, author: &str) -> &'static str {
        if let Some(color) = self.assigned.get(author) {
            return *color;
        }
        let color = AUTHOR_COLORS[self.assigned.len() % AUTHOR_COLORS.len()];
        self.assigned.insert(author.to_string(), color);
        color
    }
}
