use eframe::egui::{self, Color32, RichText, ScrollArea};

use innovest_api::models::Message;

use crate::app::{format_clock_time, state::ChatState, InnovestApp};

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut ChatState) {
    ui.horizontal(|ui| {
        if ui.button("← Back").clicked() {
            app.open_chats();
        }
        let name = state
            .other_user
            .as_ref()
            .map(|peer| peer.display_name().to_string())
            .unwrap_or_else(|| "Chat".to_string());
        let avatar_url = state.other_user.as_ref().and_then(|peer| peer.avatar_url.clone());
        app.avatar(ui, avatar_url.as_deref(), &name, 28.0);
        ui.heading(name);
        if state.loading {
            ui.add(egui::Spinner::new());
        }
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_chat(app.api.clone(), app.tx.clone(), state.chat_id);
            state.loading = true;
            state.error = None;
        }
        return;
    }

    let viewer = app.user_id();

    // Messages area
    let messages_height = ui.available_height() - 80.0;

    ScrollArea::vertical()
        .max_height(messages_height)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if state.loading && state.messages.is_empty() {
                ui.add(egui::Spinner::new());
            }
            if state.messages.is_empty() && !state.loading {
                ui.label(
                    RichText::new("No messages yet. Start the conversation!").italics(),
                );
            }

            for message in &state.messages {
                let outgoing = viewer == Some(message.sender_id);
                render_bubble(ui, message, outgoing);
                ui.add_space(4.0);
            }
        });

    ui.separator();

    // Send message input
    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [ui.available_width() - 80.0, 36.0],
            egui::TextEdit::multiline(&mut state.input).hint_text("Type a message..."),
        );

        let can_send = !state.sending && !state.input.trim().is_empty();
        if ui.add_enabled(can_send, egui::Button::new("Send")).clicked()
            || (can_send
                && response.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift))
        {
            app.spawn_send_message(state);
        }
    });

    if let Some(err) = &state.send_error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
    }
    if state.sending {
        ui.add(egui::Spinner::new());
    }
}

fn render_bubble(ui: &mut egui::Ui, message: &Message, outgoing: bool) {
    egui::Frame::none()
        .inner_margin(egui::vec2(8.0, 2.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if outgoing {
                    ui.add_space(50.0);
                }

                let fill = if outgoing {
                    ui.visuals().code_bg_color
                } else {
                    ui.visuals().extreme_bg_color
                };
                egui::Frame::group(ui.style())
                    .fill(fill)
                    .inner_margin(egui::vec2(10.0, 8.0))
                    .show(ui, |ui| {
                        ui.set_max_width(ui.available_width() - 50.0);
                        ui.label(&message.content);
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(format_clock_time(message.created_at))
                                    .size(9.0)
                                    .weak(),
                            );
                            if message.read && outgoing {
                                ui.label(RichText::new("✓ Read").size(9.0).weak());
                            }
                        });
                    });

                if !outgoing {
                    ui.add_space(50.0);
                }
            });
        });
}
