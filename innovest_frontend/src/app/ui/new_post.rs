use eframe::egui::{self, Color32, RichText};

use innovest_api::models::{PostType, Visibility};

use crate::app::{state::NewPostState, InnovestApp};

const CATEGORIES: [&str; 7] = [
    "Technology",
    "Health",
    "Education",
    "Finance",
    "Environment",
    "E-commerce",
    "Other",
];

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut NewPostState) {
    ui.horizontal(|ui| {
        if ui.button("← Back").clicked() {
            app.open_feed();
        }
        ui.heading("Create Post");
    });
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.label(
            RichText::new(format!("Share Your {}", state.post_type.label())).strong(),
        );
        ui.add_space(8.0);

        ui.label("Post Type");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut state.post_type, PostType::Idea, "💡 Idea");
            ui.selectable_value(&mut state.post_type, PostType::Milestone, "🏁 Milestone");
        });
        ui.add_space(8.0);

        ui.label("Title");
        ui.add(
            egui::TextEdit::singleline(&mut state.title)
                .hint_text("Give your post a catchy title")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        ui.label("Description");
        ui.add(
            egui::TextEdit::multiline(&mut state.description)
                .hint_text("Describe your idea or milestone...")
                .desired_rows(5)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        ui.label("Category");
        ui.horizontal_wrapped(|ui| {
            for category in CATEGORIES {
                let selected = state.category.as_deref() == Some(category);
                if ui.selectable_label(selected, category).clicked() {
                    state.category = Some(category.to_string());
                }
            }
        });
        ui.add_space(8.0);

        ui.label("Tags");
        ui.horizontal(|ui| {
            let tag_box = ui.add(
                egui::TextEdit::singleline(&mut state.tag_input).hint_text("Add tags..."),
            );
            let entered = tag_box.has_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add").clicked() || entered {
                state.add_tag();
            }
        });
        if !state.tags.is_empty() {
            ui.horizontal_wrapped(|ui| {
                let mut tag_to_remove = None;
                for tag in &state.tags {
                    if ui.button(format!("{} ✕", tag)).clicked() {
                        tag_to_remove = Some(tag.clone());
                    }
                }
                if let Some(tag) = tag_to_remove {
                    state.remove_tag(&tag);
                }
            });
        }
        ui.add_space(8.0);

        ui.label("Visibility");
        ui.horizontal(|ui| {
            for visibility in [Visibility::Public, Visibility::InvestorsOnly, Visibility::Private] {
                ui.selectable_value(&mut state.visibility, visibility, visibility.label());
            }
        });
        ui.add_space(12.0);

        let label = if state.submitting { "Creating..." } else { "Create Post" };
        if ui
            .add_enabled(
                !state.submitting,
                egui::Button::new(label).min_size(egui::vec2(ui.available_width(), 30.0)),
            )
            .clicked()
        {
            app.spawn_publish_post(state);
        }
        if let Some(err) = &state.error {
            ui.add_space(6.0);
            ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        }
    });
}
