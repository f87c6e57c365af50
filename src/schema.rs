table! {
    push_subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        endpoint -> Text,
        p256dh_key -> Text,
        auth_key -> Text,
        user_agent -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    fcm_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token -> Text,
        device_info -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    notification_settings (user_id) {
        user_id -> Uuid,
        notification_time -> Time,
        is_enabled -> Bool,
        updated_at -> Timestamptz,
    }
}

table! {
    vocabulary_words (id) {
        id -> Uuid,
        user_id -> Uuid,
        word -> Text,
        meaning -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    dispatch_log (id) {
        id -> Uuid,
        user_id -> Uuid,
        slot -> Text,
        created_at -> Timestamptz,
    }
}
