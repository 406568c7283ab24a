use diesel::prelude::*;

use crate::db::{Connection, Result};
use crate::schema::user_addresses;
use crate::types::Id;
use crate::user::User;

/// Postal address of a user, one per user
#[derive(Queryable, Identifiable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_addresses)]
pub struct Address {
	pub id: Id,
	pub user_id: Id,
	pub street_address: String,
	pub city: String,
	pub postal_code: i32,
	pub country: String,
}

#[derive(Insertable)]
#[diesel(table_name = user_addresses)]
pub struct NewAddress<'a> {
	pub user_id: Id,
	pub street_address: &'a str,
	pub city: &'a str,
	pub postal_code: i32,
	pub country: &'a str,
}

pub struct Repo<'a> {
	db: &'a mut Connection,
}

impl<'a> Repo<'a> {
	pub fn new(db: &'a mut Connection) -> Self {
		Repo { db }
	}
	
	pub fn create(&mut self, new_address: NewAddress) -> Result<Address> {
		diesel::insert_into(user_addresses::table)
			.values(&new_address)
			.get_result(self.db)
			.map_err(Into::into)
	}
	
	pub fn find_by_user(&mut self, user_id: Id) -> Result<Address> {
		user_addresses::table
			.filter(user_addresses::user_id.eq(user_id))
			.first::<Address>(self.db)
			.map_err(Into::into)
	}
	
	/// Returns the number of rows removed
	pub fn delete_for_user(&mut self, user_id: Id) -> Result<usize> {
		diesel::delete(user_addresses::table.filter(user_addresses::user_id.eq(user_id)))
			.execute(self.db)
			.map_err(Into::into)
	}
}
