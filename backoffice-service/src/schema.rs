diesel::table! {
    orders (order_id) {
        order_id -> Varchar,
        #[sql_name = "timestamp"]
        placed_at -> Timestamptz,
        customer_name -> Varchar,
        customer_phone -> Nullable<Varchar>,
        order_type -> Varchar,
        table_number -> Nullable<Varchar>,
        delivery_address -> Nullable<Text>,
        payment_method -> Varchar,
        status -> Varchar,
        items -> Jsonb,
        is_paid -> Bool,
    }
}

diesel::table! {
    documents (key) {
        key -> Varchar,
        value -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    orders,
    documents,
);
