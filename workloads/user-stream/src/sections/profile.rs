//! Profile card renderer.

use suspense_sdk::suspense_streaming::escape_html;

use crate::data::UserProfile;

/// Render a user's profile card.
pub fn render_profile(user: &UserProfile) -> String {
    let joined = match &user.join_date {
        Some(date) => format!(r#"<p class="profile-joined">Joined: {}</p>"#, escape_html(date)),
        None => String::new(),
    };

    format!(
        r#"<div class="card profile-card" data-user="{id}">
    <img src="{avatar}" alt="{name}" class="avatar">
    <div>
        <h2 class="profile-name">{name}</h2>
        <p class="profile-email">{email}</p>
        {joined}
    </div>
</div>"#,
        id = user.id,
        avatar = escape_html(&user.avatar),
        name = escape_html(&user.name),
        email = escape_html(&user.email),
        joined = joined
    )
}
