//! Integration tests for company scoping across repositories.
//!
//! Run with `cargo test -p quotely-db -- --ignored` against a database.

mod common;

use quotely_db::{
    CategoryRepository, CompanyRepository, CustomerRepository, UserRepository,
    repositories::{CategoryError, CategoryInput, CompanyError, CustomerInput, RegisterInput},
};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_normalizes_admin_email() {
    let db = common::connect().await;
    let (company, admin) = common::register_company(&db).await;

    assert_eq!(admin.email, "admin@example.com");
    assert_eq!(admin.role, "ADMIN");

    let found = UserRepository::new(db.clone())
        .find_for_login(&company.name, "ADMIN@example.com")
        .await
        .expect("query");
    assert_eq!(found.map(|u| u.id), Some(admin.id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_company_name_is_unique() {
    let db = common::connect().await;
    let (company, _) = common::register_company(&db).await;

    let err = CompanyRepository::new(db.clone())
        .register(RegisterInput {
            company_name: company.name.clone(),
            logo_url: None,
            first_name: "Other".to_string(),
            last_name: "Admin".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
        })
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, CompanyError::NameTaken(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_customers_are_scoped_to_company() {
    let db = common::connect().await;
    let (acme, _) = common::register_company(&db).await;
    let (globex, _) = common::register_company(&db).await;
    let repo = CustomerRepository::new(db.clone());

    let customer = repo
        .create(
            acme.id,
            CustomerInput {
                name: "Initech".to_string(),
                email: "buyer@initech.test".to_string(),
                phone: None,
            },
        )
        .await
        .expect("create");

    assert!(repo.find(globex.id, customer.id).await.expect("query").is_none());
    assert!(repo.list(globex.id).await.expect("list").is_empty());
    assert!(!repo.delete(globex.id, customer.id).await.expect("delete"));
    assert!(repo.delete(acme.id, customer.id).await.expect("delete"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_with_children_cannot_be_deleted() {
    let db = common::connect().await;
    let (company, _) = common::register_company(&db).await;
    let repo = CategoryRepository::new(db.clone());

    let parent = repo
        .create(
            company.id,
            CategoryInput {
                name: "Hardware".to_string(),
                description: None,
                parent_id: None,
            },
        )
        .await
        .expect("parent");
    let child = repo
        .create(
            company.id,
            CategoryInput {
                name: "Tools".to_string(),
                description: None,
                parent_id: Some(parent.id),
            },
        )
        .await
        .expect("child");

    let err = repo.delete(company.id, parent.id).await.expect_err("has children");
    assert!(matches!(err, CategoryError::Rule(ref e) if e.is_conflict()));

    repo.delete(company.id, child.id).await.expect("delete child");
    repo.delete(company.id, parent.id).await.expect("delete parent");
}
