use crate::{
    activation::{events::ActivationEvent, StageContext},
    domain::ChatKind,
};

/// HTML welcome notice posted into the freshly activated chat.
pub fn confirmation_message(kind: ChatKind, bot_username: &str, brand_name: &str) -> String {
    let label = kind.as_str();
    let icon = kind.icon();
    format!(
        "🎉 <b>Bot activated!</b>\n\n\
✅ The bot @{bot_username} is now linked to this {icon} VIP {label}!\n\n\
🔹 <b>Active features:</b>\n\
• Paying users are added automatically\n\
• Users are removed automatically when their payment expires\n\
• Integrated sales\n\n\
💡 <b>What this means:</b>\n\
Whenever someone buys a plan from this bot, they will be added to this {label} automatically!\n\n\
🚀 <b>Next steps:</b>\n\
1. Configure your plans in the dashboard\n\
2. Promote your products\n\
3. Receive payments automatically\n\n\
---\n\
<i>Powered by {brand_name} 🤖</i>"
    )
}

/// Best-effort notice; failures only flip the returned flag.
pub async fn notify(cx: &StageContext<'_>, chat_id: &str, kind: ChatKind, bot_username: &str) -> bool {
    let text = confirmation_message(kind, &escape_html(bot_username), &escape_html(cx.brand_name));
    match cx
        .bounded(cx.directory.send_message(cx.token, chat_id, &text))
        .await
    {
        Ok(()) => {
            cx.events.emit(ActivationEvent::NotificationSent);
            true
        }
        Err(err) => {
            cx.events.emit(ActivationEvent::NotificationFailed {
                description: err.description,
            });
            false
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
