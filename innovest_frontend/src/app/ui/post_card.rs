use std::collections::HashSet;

use eframe::egui::{self, Color32, RichText};
use uuid::Uuid;

use innovest_api::models::Post;

use super::super::{format_relative_time, InnovestApp};

/// Interaction taken on a card, deferred so callers can apply it after
/// their post loop ends.
pub enum PostCardAction {
    OpenProfile(Uuid),
    ToggleLike { post_id: Uuid, currently_liked: bool },
}

/// One post, rendered the same way on the feed, search, and profile
/// screens.
pub fn render(
    app: &mut InnovestApp,
    ui: &mut egui::Ui,
    post: &Post,
    liked: bool,
    like_busy: bool,
) -> Option<PostCardAction> {
    let mut action = None;

    egui::Frame::group(ui.style())
        .fill(ui.visuals().extreme_bg_color)
        .inner_margin(egui::vec2(12.0, 10.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            // Author row
            let author = post.author.clone().unwrap_or_default();
            ui.horizontal(|ui| {
                app.avatar(ui, author.avatar_url.as_deref(), author.display_name(), 32.0);
                ui.vertical(|ui| {
                    if ui.link(RichText::new(author.display_name()).strong()).clicked() {
                        action = Some(PostCardAction::OpenProfile(post.user_id));
                    }
                    ui.label(RichText::new(format_relative_time(post.created_at)).size(10.0).weak());
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(post.post_type.label()).weak());
                });
            });

            ui.add_space(4.0);
            ui.label(RichText::new(&post.title).strong().size(16.0));
            if let Some(description) = &post.description {
                if !description.is_empty() {
                    ui.label(description);
                }
            }

            if let Some(image_url) = post.image_url.as_deref() {
                if !image_url.is_empty() {
                    ui.add_space(4.0);
                    app.post_image(ui, image_url);
                }
            }

            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                if let Some(category) = &post.category {
                    ui.label(RichText::new(category).strong().size(10.0));
                }
                for tag in &post.tags {
                    ui.label(RichText::new(format!("#{}", tag)).size(10.0).weak());
                }
            });

            ui.separator();
            ui.horizontal(|ui| {
                let heart = if liked { "♥" } else { "♡" };
                let mut like_text = RichText::new(format!("{} {}", heart, post.likes_count));
                if liked {
                    like_text = like_text.color(Color32::RED);
                }
                if ui.add_enabled(!like_busy, egui::Button::new(like_text)).clicked() {
                    action = Some(PostCardAction::ToggleLike {
                        post_id: post.id,
                        currently_liked: liked,
                    });
                }
                ui.label(RichText::new(format!("💬 {}", post.comments_count)).weak());
            });
        });

    action
}

pub fn apply_action(app: &mut InnovestApp, in_flight: &mut HashSet<Uuid>, action: PostCardAction) {
    match action {
        PostCardAction::OpenProfile(profile_id) => app.open_profile(profile_id),
        PostCardAction::ToggleLike { post_id, currently_liked } => {
            in_flight.insert(post_id);
            app.spawn_toggle_like(post_id, currently_liked);
        }
    }
}
