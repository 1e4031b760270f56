use eframe::egui::{self, Context, RichText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTab {
    Home,
    Profile,
    Post,
    Notifications,
    Chats,
}

impl NavTab {
    const ALL: [NavTab; 5] = [
        NavTab::Home,
        NavTab::Profile,
        NavTab::Post,
        NavTab::Notifications,
        NavTab::Chats,
    ];

    fn label(self) -> &'static str {
        match self {
            NavTab::Home => "Home",
            NavTab::Profile => "Profile",
            NavTab::Post => "Post",
            NavTab::Notifications => "Alerts",
            NavTab::Chats => "Chats",
        }
    }
}

/// Bottom tab bar shown on every signed-in screen. Returns the tab the
/// user tapped, if any. Tapping the active tab reloads it.
pub fn render(ctx: &Context, active: Option<NavTab>) -> Option<NavTab> {
    let mut clicked = None;

    egui::TopBottomPanel::bottom("bottom_nav").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.columns(NavTab::ALL.len(), |columns| {
            for (column, tab) in columns.iter_mut().zip(NavTab::ALL) {
                column.vertical_centered(|ui| {
                    let selected = active == Some(tab);
                    if ui.selectable_label(selected, RichText::new(tab.label())).clicked() {
                        clicked = Some(tab);
                    }
                });
            }
        });
        ui.add_space(4.0);
    });

    clicked
}
