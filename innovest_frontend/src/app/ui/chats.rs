use eframe::egui::{self, Color32, RichText};

use crate::app::{format_relative_time, state::ChatsState, InnovestApp};

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut ChatsState) {
    ui.horizontal(|ui| {
        ui.heading("Messages");
        if state.loading {
            ui.add(egui::Spinner::new());
        }
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_chats(app.api.clone(), app.tx.clone());
            state.loading = true;
            state.error = None;
        }
        return;
    }

    let viewer = app.user_id();

    egui::ScrollArea::vertical().show(ui, |ui| {
        if state.chats.is_empty() && !state.loading {
            ui.label(RichText::new("No messages yet").italics());
        }

        let mut chat_to_open = None;
        for chat in &state.chats {
            let other = viewer.and_then(|viewer| chat.other_user(viewer));
            let name = other
                .map(|peer| peer.display_name().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let avatar_url = other.and_then(|peer| peer.avatar_url.clone());

            let response = egui::Frame::group(ui.style())
                .fill(ui.visuals().extreme_bg_color)
                .inner_margin(egui::vec2(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        app.avatar(ui, avatar_url.as_deref(), &name, 36.0);
                        ui.vertical(|ui| {
                            ui.label(RichText::new(&name).strong());
                            if let Some(preview) = chat.latest_message() {
                                ui.label(RichText::new(truncated(&preview.content, 60)).weak());
                            } else {
                                ui.label(RichText::new("No messages yet").size(10.0).weak());
                            }
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if let Some(preview) = chat.latest_message() {
                                ui.label(
                                    RichText::new(format_relative_time(preview.created_at))
                                        .size(10.0)
                                        .weak(),
                                );
                            }
                        });
                    });
                })
                .response;
            if response.interact(egui::Sense::click()).clicked() {
                chat_to_open = Some(chat.id);
            }
            ui.add_space(6.0);
        }

        if let Some(chat_id) = chat_to_open {
            app.open_chat(chat_id);
        }
    });
}

fn truncated(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars).collect();
    format!("{}...", kept.trim_end())
}
