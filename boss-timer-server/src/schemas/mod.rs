pub mod bosses;
