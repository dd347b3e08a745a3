use std::sync::Arc;

use async_trait::async_trait;
use hook_codegen::{
    EmitError, EmitOptions, FieldSlot, FieldType, GenerateError, HandlerGenerator, ObjectType,
    PayloadLoader, UnifiedSchema,
};
use hook_store::{
    CaptureId, CaptureStore, CapturedBody, MemoryCaptureStore, NewWebhook, StoreError,
    StoreResult, Webhook, WebhookListItem,
};
use mockall::mock;

mock! {
    pub Store {}

    #[async_trait]
    impl CaptureStore for Store {
        async fn find_by_id(&self, id: CaptureId) -> StoreResult<Option<Webhook>>;
        async fn find_many(
            &self,
            limit: u32,
            cursor: Option<CaptureId>,
        ) -> StoreResult<Vec<WebhookListItem>>;
        async fn fetch_bodies(&self, ids: &[CaptureId]) -> StoreResult<Vec<CapturedBody>>;
        async fn create(&self, webhook: NewWebhook) -> StoreResult<Webhook>;
        async fn delete(&self, id: CaptureId) -> StoreResult<bool>;
    }
}

async fn capture_all(store: &MemoryCaptureStore, bodies: &[Option<&str>]) -> Vec<CaptureId> {
    let mut ids = Vec::with_capacity(bodies.len());
    for body in bodies {
        let webhook = store
            .create(NewWebhook {
                method: "POST".to_owned(),
                pathname: "/stripe".to_owned(),
                ip: "127.0.0.1".to_owned(),
                content_type: Some("application/json".to_owned()),
                body: body.map(str::to_owned),
                ..Default::default()
            })
            .await
            .expect("failed to capture webhook");
        ids.push(webhook.id);
    }
    ids
}

async fn unify_stored(store: Arc<MemoryCaptureStore>, ids: &[CaptureId]) -> UnifiedSchema {
    let samples = PayloadLoader::new(store)
        .load(ids)
        .await
        .expect("failed to load samples");
    UnifiedSchema::unify(&samples)
}

fn generator(store: Arc<MemoryCaptureStore>) -> HandlerGenerator {
    HandlerGenerator::new(store, EmitOptions::default())
}

#[tokio::test]
async fn missing_fields_become_optional() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(r#"{"a":1}"#), Some(r#"{"a":2,"b":"x"}"#)]).await;

    let schema = unify_stored(store.clone(), &ids).await;
    assert_eq!(
        schema.root,
        FieldType::Object(
            ObjectType::new()
                .with_field("a", FieldSlot::required(FieldType::Number))
                .with_field("b", FieldSlot::optional(FieldType::String))
        )
    );

    let artifact = generator(store).generate(&ids).await.unwrap();
    insta::assert_snapshot!(artifact.code, @r###"
    // Generated from 2 captured webhook samples.

    export interface WebhookPayload {
      a: number;
      b?: string;
    }

    export async function handleWebhook(payload: WebhookPayload): Promise<void> {
      // Handle the webhook payload here.
    }
    "###);
}

#[tokio::test]
async fn conflicting_kinds_become_a_union() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(r#"{"a":1}"#), Some(r#"{"a":"s"}"#)]).await;

    let schema = unify_stored(store.clone(), &ids).await;
    assert_eq!(
        schema.root,
        FieldType::Object(ObjectType::new().with_field(
            "a",
            FieldSlot::required(FieldType::union_of([FieldType::Number, FieldType::String]))
        ))
    );

    let artifact = generator(store).generate(&ids).await.unwrap();
    assert!(artifact.code.contains("  a: number | string;\n"));
}

#[tokio::test]
async fn empty_and_unparseable_samples_are_reported() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some("null"), Some("not-json-text")]).await;

    let schema = unify_stored(store.clone(), &ids).await;
    assert_eq!(schema.root, FieldType::Unknown);
    assert_eq!(schema.tally.excluded(), 2);

    let artifact = generator(store).generate(&ids).await.unwrap();
    insta::assert_snapshot!(artifact.code, @r###"
    // Generated from 2 captured webhook samples.
    // 2 samples were excluded from inference (1 empty, 1 not valid JSON).

    export interface WebhookPayload {}

    export async function handleWebhook(payload: WebhookPayload): Promise<void> {
      // Handle the webhook payload here.
    }
    "###);
}

#[tokio::test]
async fn empty_id_list_is_rejected() {
    let store = Arc::new(MemoryCaptureStore::new());
    let result = generator(store).generate(&[]).await;
    assert!(matches!(result, Err(GenerateError::EmptyInput)));
}

#[tokio::test]
async fn array_elements_merge_across_samples() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(
        &store,
        &[
            Some(r#"[{"id": 1, "name": "a"}, {"id": 2}]"#),
            Some(r#"[{"id": 3, "email": null}]"#),
        ],
    )
    .await;

    let schema = unify_stored(store.clone(), &ids).await;
    assert_eq!(
        schema.root,
        FieldType::Array(Box::new(FieldType::Object(
            ObjectType::new()
                .with_field("id", FieldSlot::required(FieldType::Number))
                .with_field("name", FieldSlot::optional(FieldType::String))
                .with_field("email", FieldSlot::optional(FieldType::Null))
        )))
    );

    let artifact = generator(store).generate(&ids).await.unwrap();
    insta::assert_snapshot!(artifact.code, @r###"
    // Generated from 2 captured webhook samples.

    export type WebhookPayload = WebhookPayloadItem[];

    export interface WebhookPayloadItem {
      id: number;
      name?: string;
      email?: null;
    }

    export async function handleWebhook(payload: WebhookPayload): Promise<void> {
      // Handle the webhook payload here.
    }
    "###);
}

#[tokio::test]
async fn output_ignores_id_order_and_repetition() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(
        &store,
        &[
            Some(r#"{"type": "charge.succeeded", "data": {"amount": 100}}"#),
            Some(r#"{"type": "charge.refunded", "data": {"amount": 100, "reason": "dup"}}"#),
            Some(r#"{"livemode": false, "type": "ping"}"#),
        ],
    )
    .await;
    let generator = generator(store);

    let forward = generator.generate(&ids).await.unwrap();

    let mut reversed = ids.clone();
    reversed.reverse();
    assert_eq!(generator.generate(&reversed).await.unwrap(), forward);

    let repeated = [ids[2], ids[0], ids[2], ids[1], ids[0]];
    assert_eq!(generator.generate(&repeated).await.unwrap(), forward);
}

#[tokio::test]
async fn unknown_ids_are_skipped() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(r#"{"ok": true}"#)]).await;
    let generator = generator(store);

    let artifact = generator
        .generate(&[ids[0], CaptureId::now()])
        .await
        .unwrap();
    assert!(artifact
        .code
        .starts_with("// Generated from 1 captured webhook sample.\n"));

    let nothing = generator.generate(&[CaptureId::now()]).await.unwrap();
    assert!(nothing
        .code
        .starts_with("// No captured samples matched the requested ids.\n"));
    assert!(nothing.code.contains("export interface WebhookPayload {}\n"));
}

#[tokio::test]
async fn deeply_nested_documents_are_emitted() {
    let arrays = format!("{}1{}", "[".repeat(100), "]".repeat(100));
    let objects = format!("{}1{}", r#"{"a":"#.repeat(100), "}".repeat(100));

    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(arrays.as_str())]).await;
    let artifact = generator(store).generate(&ids).await.unwrap();
    assert!(artifact.code.contains(&format!(
        "export type WebhookPayload = number{};\n",
        "[]".repeat(100)
    )));

    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(objects.as_str())]).await;
    let artifact = generator(store).generate(&ids).await.unwrap();
    assert!(artifact.code.contains("export interface WebhookPayload {\n  a: A;\n}"));
    assert!(artifact.code.contains("export interface A99 {\n  a: number;\n}"));
    assert_eq!(artifact.code.matches("export interface").count(), 100);
}

#[tokio::test]
async fn store_failures_surface_as_unavailable() {
    let mut store = MockStore::new();
    store
        .expect_fetch_bodies()
        .times(1)
        .returning(|_| {
            Err(StoreError::QueryError {
                command: "SELECT".to_owned(),
                error: sqlx::Error::PoolTimedOut,
            })
        });

    let generator = HandlerGenerator::new(Arc::new(store), EmitOptions::default());
    let result = generator.generate(&[CaptureId::now()]).await;

    match result {
        Err(GenerateError::StoreUnavailable(StoreError::QueryError { command, error })) => {
            assert_eq!(command, "SELECT");
            assert!(matches!(error, sqlx::Error::PoolTimedOut));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn empty_input_does_not_touch_the_store() {
    let mut store = MockStore::new();
    store.expect_fetch_bodies().never();

    let generator = HandlerGenerator::new(Arc::new(store), EmitOptions::default());
    assert!(matches!(
        generator.generate(&[]).await,
        Err(GenerateError::EmptyInput)
    ));
}

#[tokio::test]
async fn store_results_are_ordered_before_folding() {
    let first = CaptureId::now();
    let second = CaptureId::now();

    // The store hands back the later capture first.
    let mut store = MockStore::new();
    store.expect_fetch_bodies().returning(move |_| {
        Ok(vec![
            CapturedBody {
                id: second,
                body: Some(r#"{"b": 1, "a": 1}"#.to_owned()),
            },
            CapturedBody {
                id: first,
                body: Some(r#"{"a": 1}"#.to_owned()),
            },
        ])
    });

    let generator = HandlerGenerator::new(Arc::new(store), EmitOptions::default());
    let artifact = generator.generate(&[first, second]).await.unwrap();
    assert!(artifact.code.contains("  a: number;\n  b?: number;\n"));
}

#[tokio::test]
async fn invalid_names_fail_emission() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(&store, &[Some(r#"{"a":1}"#)]).await;

    let generator = HandlerGenerator::new(
        store,
        EmitOptions {
            handler_name: "function".to_owned(),
            ..Default::default()
        },
    );
    assert!(matches!(
        generator.generate(&ids).await,
        Err(GenerateError::Emission(EmitError::InvalidIdentifier { .. }))
    ));
}

#[tokio::test]
async fn regenerating_from_example_payloads_yields_the_same_types() {
    let store = Arc::new(MemoryCaptureStore::new());
    let ids = capture_all(
        &store,
        &[
            Some(r#"{"id": "evt_1", "tags": ["a", 1], "meta": {"k": true}}"#),
            Some(r#"{"id": "evt_2", "meta": null}"#),
        ],
    )
    .await;
    let schema = unify_stored(store.clone(), &ids).await;
    let original = generator(store).generate(&ids).await.unwrap();

    let examples: Vec<String> = schema
        .root
        .example_values()
        .iter()
        .map(|value| value.to_string())
        .collect();
    let replay_store = Arc::new(MemoryCaptureStore::new());
    let replay_bodies: Vec<Option<&str>> =
        examples.iter().map(|body| Some(body.as_str())).collect();
    let replay_ids = capture_all(&replay_store, &replay_bodies).await;

    assert_eq!(unify_stored(replay_store.clone(), &replay_ids).await.root, schema.root);

    let replayed = generator(replay_store).generate(&replay_ids).await.unwrap();
    let strip_header = |code: &str| -> String {
        code.lines()
            .skip_while(|line| line.starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip_header(&replayed.code), strip_header(&original.code));
    assert!(original.code.contains("  meta: Meta | null;\n"));
    assert!(original.code.contains("  tags?: (number | string)[];\n"));
}
