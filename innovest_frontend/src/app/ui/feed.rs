use eframe::egui::{self, Color32, RichText};

use crate::app::{state::FeedState, InnovestApp};

use super::post_card;

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut FeedState) {
    ui.horizontal(|ui| {
        ui.heading("Innovest");
        if state.loading {
            ui.add(egui::Spinner::new());
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🔍 Search ideas...").clicked() {
                app.open_search();
            }
        });
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_feed(app.api.clone(), app.tx.clone());
            state.loading = true;
            state.error = None;
        }
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        let mut action = None;

        if !state.top_posts.is_empty() {
            ui.add_space(6.0);
            ui.heading("Top Reacted Posts");
            ui.add_space(6.0);
            for post in &state.top_posts {
                let liked = state.liked.contains(&post.id);
                let busy = state.like_in_flight.contains(&post.id);
                if let Some(taken) = post_card::render(app, ui, post, liked, busy) {
                    action = Some(taken);
                }
                ui.add_space(8.0);
            }
            ui.add_space(6.0);
        }

        ui.heading("Your Feed");
        ui.add_space(6.0);

        if state.posts.is_empty() {
            if state.loading {
                ui.add(egui::Spinner::new());
            } else {
                ui.label(
                    RichText::new("No posts yet. Start following some interests!").italics(),
                );
            }
        }
        for post in &state.posts {
            let liked = state.liked.contains(&post.id);
            let busy = state.like_in_flight.contains(&post.id);
            if let Some(taken) = post_card::render(app, ui, post, liked, busy) {
                action = Some(taken);
            }
            ui.add_space(8.0);
        }

        if let Some(action) = action {
            post_card::apply_action(app, &mut state.like_in_flight, action);
        }
    });
}
