use eframe::egui::{self, Color32, RichText};

use crate::app::{
    state::{AuthMode, AuthState},
    InnovestApp,
};

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut AuthState) {
    ui.add_space(48.0);
    ui.vertical_centered(|ui| {
        ui.set_max_width(360.0);

        ui.heading(RichText::new("Innovest").size(28.0));
        ui.label(RichText::new("Share ideas. Back the ones you believe in.").weak());
        ui.add_space(24.0);

        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(16.0, 16.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut state.mode, AuthMode::SignIn, "Sign In");
                    ui.selectable_value(&mut state.mode, AuthMode::SignUp, "Sign Up");
                });
                ui.add_space(12.0);

                ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                    ui.label("Email");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.email)
                            .hint_text("you@example.com")
                            .desired_width(f32::INFINITY),
                    );
                    ui.add_space(6.0);

                    ui.label("Password");
                    let password_box = ui.add(
                        egui::TextEdit::singleline(&mut state.password)
                            .password(true)
                            .desired_width(f32::INFINITY),
                    );
                    ui.add_space(12.0);

                    let submit_label = match state.mode {
                        AuthMode::SignIn => "Sign In",
                        AuthMode::SignUp => "Create Account",
                    };
                    let submitted = ui
                        .add_enabled(
                            !state.submitting,
                            egui::Button::new(submit_label)
                                .min_size(egui::vec2(ui.available_width(), 28.0)),
                        )
                        .clicked()
                        || (password_box.has_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter)));
                    if submitted && !state.submitting {
                        app.spawn_submit_auth(state);
                    }
                });

                if state.submitting {
                    ui.add_space(6.0);
                    ui.add(egui::Spinner::new());
                }
                if let Some(err) = &state.error {
                    ui.add_space(6.0);
                    ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
                }
                if let Some(notice) = &state.notice {
                    ui.add_space(6.0);
                    ui.colored_label(Color32::LIGHT_GREEN, notice);
                }
            });
    });
}
