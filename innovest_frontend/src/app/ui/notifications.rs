use eframe::egui::{self, Color32, RichText};

use crate::app::{format_relative_time, state::NotificationsState, InnovestApp};

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut NotificationsState) {
    ui.horizontal(|ui| {
        ui.heading("Notifications");
        let unread = state.unread_count();
        if unread > 0 {
            ui.label(RichText::new(format!("{} unread", unread)).weak());
        }
        if state.loading {
            ui.add(egui::Spinner::new());
        }
        if state.subscription.is_some() {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(RichText::new("● live").size(10.0).weak());
            });
        }
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_notifications(app.api.clone(), app.tx.clone());
            state.loading = true;
            state.error = None;
        }
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        if state.notifications.is_empty() && !state.loading {
            ui.label(RichText::new("No notifications yet").italics());
        }

        let mut to_mark = None;
        for notification in &state.notifications {
            let marking = state.marking.contains(&notification.id);
            let fill = if notification.read {
                ui.visuals().extreme_bg_color
            } else {
                ui.visuals().code_bg_color
            };

            let response = egui::Frame::group(ui.style())
                .fill(fill)
                .inner_margin(egui::vec2(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        let title = notification.title.as_deref().unwrap_or("Notification");
                        let title = if notification.read {
                            RichText::new(title).weak()
                        } else {
                            RichText::new(title).strong()
                        };
                        ui.label(title);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format_relative_time(notification.created_at))
                                    .size(10.0)
                                    .weak(),
                            );
                            if marking {
                                ui.add(egui::Spinner::new());
                            }
                        });
                    });
                    if let Some(message) = &notification.message {
                        ui.label(RichText::new(message).weak());
                    }
                })
                .response;

            // Tapping an unread row marks it read.
            if !notification.read
                && !marking
                && response.interact(egui::Sense::click()).clicked()
            {
                to_mark = Some(notification.id);
            }
            ui.add_space(6.0);
        }

        if let Some(id) = to_mark {
            app.spawn_mark_notification_read(state, id);
        }
    });
}
