//! Typed suggestion templates.
//!
//! Template text is parsed once when the catalog loads. Every `{name}` must
//! be a known [`Placeholder`]; a catalog with an unknown placeholder fails to
//! load instead of rendering a literal `{name}` later.

use super::category::Category;
use super::EngineError;
use std::collections::HashMap;

/// A value substituted into template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Most used application
    App,
    App1,
    App2,
    App3,
    /// Estimated focus stretch in minutes
    Duration,
    /// "morning", "afternoon", "evening" or "late night"
    TimeOfDay,
    StartTime,
    EndTime,
}

impl Placeholder {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "app" => Placeholder::App,
            "app1" => Placeholder::App1,
            "app2" => Placeholder::App2,
            "app3" => Placeholder::App3,
            "duration" => Placeholder::Duration,
            "time_of_day" => Placeholder::TimeOfDay,
            "start_time" => Placeholder::StartTime,
            "end_time" => Placeholder::EndTime,
            _ => return None,
        })
    }
}

/// Values for every placeholder, derived from a feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// Up to three applications, most used first
    pub top_apps: Vec<String>,
    /// `None` when the feature set carried no activity
    pub activity_density: Option<f64>,
    /// Local hour, 0-23
    pub hour: u32,
}

impl RenderContext {
    pub fn value(&self, placeholder: Placeholder) -> String {
        let app = |i: usize, fallback: &str| {
            self.top_apps
                .get(i)
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };

        match placeholder {
            Placeholder::App => app(0, "your frequently used application"),
            Placeholder::App1 => app(0, "your first application"),
            Placeholder::App2 => app(1, "your second application"),
            Placeholder::App3 => app(2, "your third application"),
            Placeholder::Duration => self.duration_minutes().to_string(),
            Placeholder::TimeOfDay => time_of_day_label(self.hour).to_string(),
            Placeholder::StartTime => format!("{}:00", (self.hour as i64 - 1).clamp(8, 11)),
            Placeholder::EndTime => format!("{}:00", (self.hour as i64 + 1).clamp(16, 20)),
        }
    }

    /// Ten minutes per record-per-hour, kept within 10..=120.
    pub fn duration_minutes(&self) -> i64 {
        let density = self.activity_density.unwrap_or(5.0);
        ((density * 10.0) as i64).clamp(10, 120)
    }
}

pub fn time_of_day_label(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=21 => "evening",
        _ => "late night",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Placeholder),
}

/// One parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub category: Category,
    pub text: String,
    pub placeholders: Vec<Placeholder>,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(
        id: impl Into<String>,
        category: Category,
        text: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let id = id.into();
        let text = text.into();
        let mut segments = Vec::new();
        let mut placeholders = Vec::new();
        let mut rest = text.as_str();

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| EngineError::UnknownPlaceholder {
                template: id.clone(),
                name: after.to_string(),
            })?;
            let name = &after[..close];
            let placeholder =
                Placeholder::from_name(name).ok_or_else(|| EngineError::UnknownPlaceholder {
                    template: id.clone(),
                    name: name.to_string(),
                })?;
            if !placeholders.contains(&placeholder) {
                placeholders.push(placeholder);
            }
            segments.push(Segment::Slot(placeholder));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            id,
            category,
            text,
            placeholders,
            segments,
        })
    }

    pub fn render(&self, ctx: &RenderContext) -> String {
        let values: HashMap<Placeholder, String> = self
            .placeholders
            .iter()
            .map(|p| (*p, ctx.value(*p)))
            .collect();

        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Slot(p) => values.get(p).map(String::as_str).unwrap_or_default(),
            })
            .collect()
    }
}

/// All templates, grouped by category.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    by_category: HashMap<Category, Vec<Template>>,
}

impl TemplateCatalog {
    /// Build a catalog from `(category, text)` pairs. Ids are assigned as
    /// `<category>-<n>`.
    pub fn from_texts<'a, I>(texts: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (Category, &'a str)>,
    {
        let mut by_category: HashMap<Category, Vec<Template>> = HashMap::new();
        for (category, text) in texts {
            let slot = by_category.entry(category).or_default();
            let id = format!("{}-{}", category.as_str(), slot.len() + 1);
            slot.push(Template::parse(id, category, text)?);
        }
        Ok(Self { by_category })
    }

    /// The shipped template corpus.
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_texts(BUILTIN_TEMPLATES.iter().copied())
    }

    pub fn templates(&self, category: Category) -> &[Template] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const BUILTIN_TEMPLATES: &[(Category, &str)] = &[
    (Category::Productivity, "Consider using keyboard shortcuts for {app} to speed up your workflow."),
    (Category::Productivity, "You've been switching frequently between {app1} and {app2}. Try using split screen to view both at once."),
    (Category::Productivity, "Your most productive hours appear to be in the {time_of_day}. Consider scheduling important tasks during this time."),
    (Category::Productivity, "You seem to work well with {app}. Try allocating more focused time for tasks using this application."),
    (Category::Productivity, "Based on your patterns, you may benefit from the Pomodoro technique: 25 minutes of focus followed by a 5-minute break."),
    (Category::Organization, "You frequently access multiple files. Consider creating project-specific folders to keep related files together."),
    (Category::Organization, "Your desktop has many items. Try organizing them into folders for better visual clarity and faster access."),
    (Category::Organization, "Consider using tagging or a naming convention for your files to make them easier to search and organize."),
    (Category::Organization, "You use {app} frequently. Consider creating templates for common tasks in this application."),
    (Category::Organization, "Try grouping similar applications together in your dock/taskbar for more efficient access."),
    (Category::TimeManagement, "You tend to spend {duration} minutes on {app} at a time. Consider setting a timer to keep these sessions focused."),
    (Category::TimeManagement, "Your {time_of_day} schedule shows frequent application switching. Try time-blocking to reduce context switching."),
    (Category::TimeManagement, "Consider scheduling specific times for checking email and messages rather than switching to them frequently."),
    (Category::TimeManagement, "You seem most active between {start_time} and {end_time}. Try scheduling your most important tasks during this period."),
    (Category::TimeManagement, "Your data shows you typically spend {duration} minutes in meetings. Consider setting 45-minute meetings instead of 60-minute ones for more breaks."),
    (Category::Ergonomics, "You've been working continuously for {duration} minutes. Remember to take short breaks to rest your eyes and stretch."),
    (Category::Ergonomics, "Consider adjusting your workspace for better ergonomics: keyboard at elbow level, monitor at eye level."),
    (Category::Ergonomics, "Remember the 20-20-20 rule: every 20 minutes, look at something 20 feet away for 20 seconds to reduce eye strain."),
    (Category::Ergonomics, "Try incorporating standing periods into your work routine to reduce sitting time."),
    (Category::Ergonomics, "Consider enabling night mode or blue light filters during evening work sessions to reduce eye strain."),
    (Category::BreakReminders, "You've been working for {duration} minutes straight. Take a quick 5-minute break to stretch and rest your eyes."),
    (Category::BreakReminders, "Time for a hydration break! Staying hydrated improves cognitive function and energy levels."),
    (Category::BreakReminders, "Consider taking a short walk to refresh your mind after this intense work session."),
    (Category::BreakReminders, "You've been in meetings for {duration} minutes today. Try to take short breaks between consecutive meetings."),
    (Category::BreakReminders, "After focusing on {app} for {duration} minutes, a short break might help maintain your productivity."),
    (Category::WorkflowOptimization, "You frequently transition between {app1} and {app2}. Consider learning how to integrate these tools better."),
    (Category::WorkflowOptimization, "Your workflow includes many repetitive tasks in {app}. Explore if these can be automated or streamlined."),
    (Category::WorkflowOptimization, "You might benefit from using a clipboard manager to handle the frequent copy-paste operations you perform."),
    (Category::WorkflowOptimization, "Consider using a password manager to streamline your login processes across applications."),
    (Category::WorkflowOptimization, "Your data shows you work with multiple browser tabs. Try organizing them with tab management extensions."),
    (Category::FocusSuggestions, "Consider using a website blocker during your work sessions to minimize distractions."),
    (Category::FocusSuggestions, "Your most focused work happens in {time_of_day} sessions. Try scheduling complex tasks during this time."),
    (Category::FocusSuggestions, "You tend to switch applications frequently. Try using full-screen mode for your primary task to reduce distractions."),
    (Category::FocusSuggestions, "Consider using noise-cancelling headphones or background music to maintain focus during your work sessions."),
    (Category::FocusSuggestions, "Try the 'two-minute rule': if a task takes less than two minutes, do it immediately rather than switching context."),
    (Category::AppConsolidation, "You're using multiple applications for similar tasks. Consider consolidating to fewer tools for better efficiency."),
    (Category::AppConsolidation, "You frequently use {app1}, {app2}, and {app3} together. Look for a unified solution that combines these functions."),
    (Category::AppConsolidation, "Consider using fewer browser tabs by bookmarking frequently visited sites or using a start page."),
    (Category::AppConsolidation, "Your data shows you use multiple communication tools. Consider standardizing on fewer platforms when possible."),
    (Category::AppConsolidation, "Try using keyboard launchers or command palettes to reduce time navigating between applications."),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(apps: &[&str], density: Option<f64>, hour: u32) -> RenderContext {
        RenderContext {
            top_apps: apps.iter().map(|s| s.to_string()).collect(),
            activity_density: density,
            hour,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = TemplateCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 40);
        for category in Category::ALL {
            assert_eq!(catalog.templates(category).len(), 5);
        }
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = Template::parse("t", Category::Productivity, "Hello {user}").unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlaceholder { ref name, .. } if name == "user"));

        let err = Template::parse("t", Category::Productivity, "Open {app").unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlaceholder { .. }));
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let template = Template::parse(
            "t",
            Category::AppConsolidation,
            "{app1}, {app2}, and {app3} for {duration} min in the {time_of_day}",
        )
        .unwrap();
        let text = template.render(&ctx(&["Editor", "Browser"], Some(3.0), 20));
        assert_eq!(
            text,
            "Editor, Browser, and your third application for 30 min in the evening"
        );
    }

    #[test]
    fn test_app_fallback_phrase() {
        let context = ctx(&[], None, 9);
        assert_eq!(
            context.value(Placeholder::App),
            "your frequently used application"
        );
        assert_eq!(context.value(Placeholder::App1), "your first application");
    }

    #[test]
    fn test_duration_clamped() {
        assert_eq!(ctx(&[], None, 9).duration_minutes(), 50);
        assert_eq!(ctx(&[], Some(0.0), 9).duration_minutes(), 10);
        assert_eq!(ctx(&[], Some(2.59), 9).duration_minutes(), 25);
        assert_eq!(ctx(&[], Some(40.0), 9).duration_minutes(), 120);
    }

    #[test]
    fn test_work_hour_window() {
        assert_eq!(ctx(&[], None, 3).value(Placeholder::StartTime), "8:00");
        assert_eq!(ctx(&[], None, 10).value(Placeholder::StartTime), "9:00");
        assert_eq!(ctx(&[], None, 23).value(Placeholder::StartTime), "11:00");
        assert_eq!(ctx(&[], None, 3).value(Placeholder::EndTime), "16:00");
        assert_eq!(ctx(&[], None, 17).value(Placeholder::EndTime), "18:00");
        assert_eq!(ctx(&[], None, 23).value(Placeholder::EndTime), "20:00");
    }

    #[test]
    fn test_time_of_day_labels() {
        assert_eq!(time_of_day_label(4), "late night");
        assert_eq!(time_of_day_label(5), "morning");
        assert_eq!(time_of_day_label(12), "afternoon");
        assert_eq!(time_of_day_label(17), "evening");
        assert_eq!(time_of_day_label(22), "late night");
    }
}
