use eframe::egui::{self, Color32, RichText};

use innovest_api::models::ConnectionStatus;

use crate::app::{
    format_usd,
    state::{ProfileState, RelationshipState},
    InnovestApp,
};

use super::post_card;

pub fn render(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut ProfileState) {
    ui.horizontal(|ui| {
        ui.heading("Profile");
        if state.loading {
            ui.add(egui::Spinner::new());
        }
        if state.is_own {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if state.signing_out { "Signing out..." } else { "Sign Out" };
                if ui.add_enabled(!state.signing_out, egui::Button::new(label)).clicked() {
                    app.spawn_sign_out(state);
                }
            });
        }
    });
    ui.separator();

    if let Some(err) = &state.error {
        ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", err));
        if ui.button("Retry").clicked() {
            crate::app::tasks::load_profile(app.api.clone(), app.tx.clone(), state.profile_id);
            state.loading = true;
            state.error = None;
        }
        return;
    }

    let Some(profile) = state.profile.clone() else {
        if !state.loading {
            ui.label(RichText::new("Profile unavailable").italics());
        }
        return;
    };

    egui::ScrollArea::vertical().show(ui, |ui| {
        // Identity card
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(12.0, 12.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                let name = profile.full_name.as_deref().unwrap_or("Unknown");
                ui.horizontal(|ui| {
                    app.avatar(ui, profile.avatar_url.as_deref(), name, 56.0);
                    ui.vertical(|ui| {
                        ui.label(RichText::new(name).strong().size(18.0));
                        if state.is_own {
                            if let Some(email) =
                                app.current_user.as_ref().and_then(|u| u.email.as_deref())
                            {
                                ui.label(RichText::new(email).weak());
                            }
                        }
                        if let Some(role) = profile.role {
                            ui.label(RichText::new(role.label()).size(10.0).strong());
                        }
                    });
                });

                if let Some(bio) = &profile.bio {
                    if !bio.is_empty() {
                        ui.add_space(6.0);
                        ui.label(bio);
                    }
                }

                if !profile.interests.is_empty() {
                    ui.add_space(6.0);
                    ui.label(RichText::new("Interests").strong());
                    ui.horizontal_wrapped(|ui| {
                        for interest in &profile.interests {
                            ui.label(RichText::new(interest).size(10.0).weak());
                        }
                    });
                }
            });

        if !state.is_own {
            ui.add_space(8.0);
            render_relationship_controls(app, ui, state);
        }

        if state.is_own && !state.investments.is_empty() {
            ui.add_space(12.0);
            ui.heading("Investments");
            ui.add_space(6.0);
            render_investments(app, ui, state);
        }

        ui.add_space(12.0);
        ui.heading("Posts");
        ui.add_space(6.0);
        if state.posts.is_empty() && !state.loading {
            ui.label(RichText::new("No posts yet").italics());
        }

        let mut action = None;
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

/// Connect / accept / decline / disconnect buttons, driven entirely by the
/// pair's connection row.
fn render_relationship_controls(
    app: &mut InnovestApp,
    ui: &mut egui::Ui,
    state: &mut ProfileState,
) {
    let Some(viewer) = app.user_id() else {
        return;
    };
    let relationship = state.relationship(viewer);
    let busy = state.action_in_flight;

    ui.horizontal(|ui| {
        match relationship {
            RelationshipState::NotConnected => {
                if ui.add_enabled(!busy, egui::Button::new("Connect")).clicked() {
                    app.spawn_request_connection(state);
                }
            }
            RelationshipState::PendingOutgoing => {
                ui.label(RichText::new("Request pending").weak());
                if ui.add_enabled(!busy, egui::Button::new("Cancel Request")).clicked() {
                    app.spawn_remove_connection(state);
                }
            }
            RelationshipState::PendingIncoming => {
                ui.label(RichText::new("Wants to connect").weak());
                if ui.add_enabled(!busy, egui::Button::new("Accept")).clicked() {
                    app.spawn_respond_connection(state, ConnectionStatus::Accepted);
                }
                if ui.add_enabled(!busy, egui::Button::new("Decline")).clicked() {
                    app.spawn_respond_connection(state, ConnectionStatus::Rejected);
                }
            }
            RelationshipState::Connected => {
                let label = if state.opening_chat { "Opening..." } else { "💬 Message" };
                if ui.add_enabled(!state.opening_chat, egui::Button::new(label)).clicked() {
                    app.spawn_open_chat_with(state);
                }
                if ui.add_enabled(!busy, egui::Button::new("Disconnect")).clicked() {
                    app.spawn_remove_connection(state);
                }
            }
            RelationshipState::Declined => {
                ui.label(RichText::new("Request declined").weak());
            }
        }
        if busy {
            ui.add(egui::Spinner::new());
        }
    });
}

fn render_investments(app: &mut InnovestApp, ui: &mut egui::Ui, state: &mut ProfileState) {
    let viewer = app.user_id();
    let mut investment_to_open = None;

    for investment in &state.investments {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(12.0, 8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    let title = investment
                        .post
                        .as_ref()
                        .and_then(|post| post.title.as_deref())
                        .unwrap_or("Untitled idea");
                    if ui.link(RichText::new(title).strong()).clicked() {
                        investment_to_open = Some(investment.id);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(format_usd(investment.amount)).strong());
                    });
                });

                let viewer_is_investor = viewer == Some(investment.investor_id);
                let (label, counterpart) = if viewer_is_investor {
                    ("Innovator", investment.innovator.as_ref())
                } else {
                    ("Investor", investment.investor.as_ref())
                };
                if let Some(counterpart) = counterpart {
                    ui.label(
                        RichText::new(format!("{}: {}", label, counterpart.display_name()))
                            .size(10.0)
                            .weak(),
                    );
                }
                if let Some(status) = &investment.status {
                    ui.label(RichText::new(status).size(10.0).weak());
                }
            });
        ui.add_space(6.0);
    }

    if let Some(investment_id) = investment_to_open {
        app.open_investment(investment_id);
    }
}
