use recipe_ingest::config::CacheConfig;
use recipe_ingest::model::RecipePatch;
use recipe_ingest::{
    Category, IngestError, MemoryRepository, Recipe, RecipeCaches, RecipeService, Repository,
    ScaleRequest, Submission,
};
use std::sync::Arc;

const URL: &str = "https://food.test/recipes/shakshuka";

fn shakshuka() -> Recipe {
    Recipe {
        title: "Shakshuka".to_string(),
        category: Category::Breakfast,
        ingredients: vec![
            "4 eggs".to_string(),
            "1 1/2 cups crushed tomatoes".to_string(),
            "salt to taste".to_string(),
        ],
        instructions: vec!["Simmer the sauce".to_string(), "Poach the eggs".to_string()],
        servings: 2,
        original_url: URL.to_string(),
        link: Recipe::link_for(Category::Breakfast, "shakshuka"),
        ..Recipe::default()
    }
}

async fn setup() -> (RecipeService, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    repo.create_user("alice").await.unwrap();
    repo.create_user("bob").await.unwrap();
    repo.save_recipe_for_user("alice", "shakshuka", &shakshuka())
        .await
        .unwrap();
    let caches = Arc::new(RecipeCaches::new(&CacheConfig::default()));
    (RecipeService::new(repo.clone(), caches), repo)
}

#[tokio::test]
async fn test_submit_links_existing_recipe() {
    let (service, repo) = setup().await;

    let submission = service.submit_url("bob", URL).await.unwrap();
    assert_eq!(
        submission,
        Submission::Linked {
            slug: "shakshuka".to_string()
        }
    );
    assert!(repo.fetch_pending_queue(0).await.unwrap().is_empty());
    assert_eq!(service.count_recipes("bob").await.unwrap(), 1);
}

#[tokio::test]
async fn test_submit_new_url_is_queued_once() {
    let (service, repo) = setup().await;
    let url = "https://food.test/recipes/new-dish";

    let first = service.submit_url("bob", url).await.unwrap();
    let second = service.submit_url("bob", url).await.unwrap();
    match (first, second) {
        (Submission::Queued(a), Submission::Queued(b)) => assert_eq!(a.id, b.id),
        other => panic!("expected two queued submissions, got {:?}", other),
    }
    assert_eq!(repo.fetch_pending_queue(0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_recipe_scales_a_copy() {
    let (service, _repo) = setup().await;

    let scaled = service
        .get_recipe("alice", "shakshuka", ScaleRequest::servings(4.0))
        .await
        .unwrap();
    assert_eq!(scaled.servings, 4);
    assert_eq!(scaled.original_servings, 2);
    assert_eq!(
        scaled.ingredients,
        vec!["8 eggs", "3 cups crushed tomatoes", "salt to taste"]
    );

    // The cached value is untouched by the scaled read
    let plain = service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert_eq!(plain.servings, 2);
    assert_eq!(plain.ingredients[0], "4 eggs");
}

#[tokio::test]
async fn test_writes_invalidate_cached_reads() {
    let (service, _repo) = setup().await;

    let before = service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert!(!before.is_favorite);
    assert_eq!(service.list_recipes("alice", None).await.unwrap().len(), 1);

    let patch = RecipePatch {
        title: Some("Green Shakshuka".to_string()),
        ..RecipePatch::default()
    };
    service.patch_recipe("alice", "shakshuka", &patch).await.unwrap();
    service.set_favorite("alice", "shakshuka", true).await.unwrap();
    service
        .upsert_note("alice", "shakshuka", "add feta")
        .await
        .unwrap();

    let after = service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert_eq!(after.title, "Green Shakshuka");
    assert!(after.is_favorite);
    assert_eq!(after.note.as_deref(), Some("add feta"));

    let listed = service.list_recipes("alice", None).await.unwrap();
    assert_eq!(listed[0].title, "Green Shakshuka");
    assert_eq!(service.list_favorites("alice").await.unwrap().len(), 1);

    service.delete_note("alice", "shakshuka").await.unwrap();
    let after = service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert!(after.note.is_none());
}

#[tokio::test]
async fn test_delete_recipe() {
    let (service, _repo) = setup().await;
    service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();

    service.delete_recipe("alice", "shakshuka").await.unwrap();

    let result = service
        .get_recipe("alice", "shakshuka", ScaleRequest::default())
        .await;
    assert!(matches!(result, Err(IngestError::Repository(e)) if e.is_not_found()));
    assert!(service.list_recipes("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_and_category_counts() {
    let (service, _repo) = setup().await;

    let found = service.search_recipes("alice", "shak").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(service.search_recipes("alice", "pizza").await.unwrap().is_empty());

    let counts = service.category_counts("alice").await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].category, Category::Breakfast);
    assert_eq!(counts[0].count, 1);
}

#[tokio::test]
async fn test_patch_invalidates_every_linked_user() {
    let (service, _repo) = setup().await;
    service.submit_url("bob", URL).await.unwrap();

    let cached = service
        .get_recipe("bob", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert_eq!(cached.title, "Shakshuka");
    assert_eq!(service.list_recipes("bob", None).await.unwrap().len(), 1);

    let patch = RecipePatch {
        title: Some("Red Shakshuka".to_string()),
        ..RecipePatch::default()
    };
    service.patch_recipe("alice", "shakshuka", &patch).await.unwrap();

    let seen_by_bob = service
        .get_recipe("bob", "shakshuka", ScaleRequest::default())
        .await
        .unwrap();
    assert_eq!(seen_by_bob.title, "Red Shakshuka");
    assert_eq!(
        service.list_recipes("bob", None).await.unwrap()[0].title,
        "Red Shakshuka"
    );
}
