//! Initial schema: companies, users, catalog, customers, templates and quotes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SCHEMA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r"
CREATE EXTENSION IF NOT EXISTS pgcrypto;

CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    logo_url TEXT NOT NULL DEFAULT '/default-logo.png',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_companies_name UNIQUE (name)
);

CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password_hash TEXT NOT NULL,
    role VARCHAR(16) NOT NULL DEFAULT 'USER',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_users_role CHECK (role IN ('ADMIN', 'USER'))
);

-- Email is unique per company, case-insensitively
CREATE UNIQUE INDEX uq_users_company_email ON users(company_id, lower(email));

CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    parent_id UUID REFERENCES categories(id) ON DELETE RESTRICT,
    CONSTRAINT chk_categories_not_self_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_categories_company ON categories(company_id, name);
CREATE INDEX idx_categories_parent ON categories(parent_id);

CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    price NUMERIC(19, 4) NOT NULL,
    unit VARCHAR(50) NOT NULL,
    category_name VARCHAR(255),
    image_urls JSONB NOT NULL DEFAULT '[]'::jsonb,
    CONSTRAINT chk_products_price CHECK (price >= 0),
    CONSTRAINT chk_products_image_urls CHECK (jsonb_typeof(image_urls) = 'array')
);

CREATE INDEX idx_products_company ON products(company_id, name);

CREATE TABLE product_variants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    price NUMERIC(19, 4) NOT NULL,
    CONSTRAINT chk_variants_price CHECK (price >= 0)
);

CREATE INDEX idx_variants_product ON product_variants(product_id);

CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(50)
);

CREATE INDEX idx_customers_company ON customers(company_id, name);

CREATE TABLE quote_templates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    category_id UUID REFERENCES categories(id) ON DELETE RESTRICT,
    content TEXT NOT NULL
);

CREATE INDEX idx_templates_company ON quote_templates(company_id, name);
CREATE INDEX idx_templates_category ON quote_templates(category_id);

CREATE TABLE quotes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    customer_name VARCHAR(255) NOT NULL,
    customer_email VARCHAR(255) NOT NULL,
    template_name VARCHAR(255),
    category_name VARCHAR(255),
    status VARCHAR(16) NOT NULL DEFAULT 'DRAFT',
    subtotal NUMERIC(19, 4) NOT NULL,
    tax_percentage NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL,
    total NUMERIC(19, 4) NOT NULL,
    advance_payment NUMERIC(19, 4) NOT NULL DEFAULT 0,
    digital_signature TEXT,
    signed_at TIMESTAMPTZ,
    items JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_quotes_status CHECK (status IN ('DRAFT', 'APPROVED')),
    CONSTRAINT chk_quotes_tax_percentage CHECK (tax_percentage >= 0 AND tax_percentage <= 100),
    CONSTRAINT chk_quotes_advance CHECK (advance_payment >= 0),
    CONSTRAINT chk_quotes_approved_signed CHECK (status <> 'APPROVED' OR digital_signature IS NOT NULL)
);

CREATE INDEX idx_quotes_company ON quotes(company_id, created_at DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS quotes CASCADE;
DROP TABLE IF EXISTS quote_templates CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS product_variants CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
";
