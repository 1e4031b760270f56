use eframe::egui::{self, Color32, RichText};

use innovest_api::models::Role;

use crate::app::{state::OnboardingState, InnovestApp};

const INTERESTS: [&str; 12] = [
    "AI",
    "Health",
    "Education",
    "Finance",
    "Technology",
    "Environment",
    "E-commerce",
    "Social Media",
    "Gaming",
    "Food",
    "Transportation",
    "Real Estate",
];

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut OnboardingState) {
    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.set_max_width(440.0);

            ui.heading("Welcome to Innovest!");
            ui.label(RichText::new("Let's personalize your experience").weak());
            ui.add_space(16.0);

            ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                ui.label(RichText::new("Choose your role").strong());
                ui.add_space(6.0);
                ui.columns(2, |columns| {
                    role_card(
                        &mut columns[0],
                        state,
                        Role::Innovator,
                        "Share your ideas and milestones",
                    );
                    role_card(
                        &mut columns[1],
                        state,
                        Role::Investor,
                        "Discover and back promising ideas",
                    );
                });

                ui.add_space(16.0);
                ui.label(RichText::new("Select your interests").strong());
                ui.label(RichText::new("Pick at least one to build your feed").size(10.0).weak());
                ui.add_space(6.0);
                ui.horizontal_wrapped(|ui| {
                    for interest in INTERESTS {
                        let selected = state.interests.iter().any(|i| i == interest);
                        if ui.selectable_label(selected, interest).clicked() {
                            state.toggle_interest(interest);
                        }
                    }
                });

                ui.add_space(16.0);
                let ready = !state.submitting && !state.interests.is_empty();
                let label = if state.submitting { "Setting up..." } else { "Complete Setup" };
                if ui
                    .add_enabled(
                        ready,
                        egui::Button::new(label).min_size(egui::vec2(ui.available_width(), 30.0)),
                    )
                    .clicked()
                {
                    app.spawn_save_onboarding(state);
                }
                if let Some(err) = &state.error {
                    ui.add_space(6.0);
                    ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
                }
            });
        });
    });
}

fn role_card(ui: &mut egui::Ui, state: &mut OnboardingState, role: Role, description: &str) {
    let selected = state.role == role;
    let fill = if selected {
        ui.visuals().selection.bg_fill.gamma_multiply(0.2)
    } else {
        ui.visuals().extreme_bg_color
    };

    let response = egui::Frame::group(ui.style())
        .fill(fill)
        .inner_margin(egui::vec2(10.0, 10.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(role.label()).strong());
            ui.label(RichText::new(description).size(10.0).weak());
        })
        .response;
    if response.interact(egui::Sense::click()).clicked() {
        state.role = role;
    }
}
